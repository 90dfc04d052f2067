//! # Messaging Module
//!
//! Queue-boundary structures: the step payload decoded from each task, the
//! downstream order record, and the dispatcher that feeds the next saga step.
//!
//! ```rust
//! use saga_order_step::messaging::{NextStepDispatcher, NextStepPayload, Order, QueueDispatcher};
//!
//! # tokio_test::block_on(async {
//! let (dispatcher, mut next_steps) = QueueDispatcher::channel("payment", 8);
//! let order = Order { id: 42, token_id: 7, amount: 100, ..Default::default() };
//!
//! dispatcher
//!     .dispatch(NextStepPayload::from_order(&order, "alice"))
//!     .await
//!     .unwrap();
//!
//! let task = next_steps.recv().await.unwrap();
//! assert_eq!(task.queue, "payment");
//! # });
//! ```

pub mod dispatcher;
pub mod payload;

pub use dispatcher::{NextStepDispatcher, QueueDispatcher, QueuedTask};
pub use payload::{NextStepPayload, Order, StepPayload};
