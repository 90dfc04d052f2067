//! # Execution Module
//!
//! Per-invocation context and the cancellation-aware executor that runs one
//! side of the action pair.

pub mod context;
pub mod executor;

pub use context::{FaultInjection, TaskContext};
pub use executor::execute_cancellable;
