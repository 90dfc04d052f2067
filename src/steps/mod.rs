//! # Saga Step
//!
//! The action pair for the order step and the queue-facing handlers around it.

pub mod actions;
pub mod handlers;

pub use actions::{action_for, perform, revert, StepAction};
pub use handlers::StepTaskHandler;
