#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Saga Order Step
//!
//! Worker core for the order step of a distributed saga: a forward action that
//! creates an order in the downstream order service and a compensating action
//! that marks it failed and deletes it.
//!
//! ## Architecture
//!
//! The queue delivers an encoded payload to a [`StepTaskHandler`], which:
//!
//! - decodes the payload, rejecting malformed input as terminal before any
//!   network call
//! - opens one span named `{queue}.{perform|revert}` for the invocation
//! - consults circuit breaker admission before perform, short-circuiting to a
//!   default response (with a status update) when the breaker rejects
//! - runs the action on its own task, racing it against the queue's
//!   cancellation signal (cancellation abandons the wait, never the action)
//! - classifies the result into an [`Outcome`]: success, retryable, or terminal
//!
//! ## Module Organization
//!
//! - [`steps`] - Action pair and queue-facing handlers
//! - [`execution`] - Task context and cancellation-aware executor
//! - [`client`] - Order service client and status reporter
//! - [`resilience`] - Breaker gate contract and default circuit breaker
//! - [`messaging`] - Payloads and next-step dispatch
//! - [`telemetry`] - Injected step tracer and span glue
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging and span export
//! - [`error`] - Error taxonomy and outcome classification
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use saga_order_step::config::ConfigManager;
//! use saga_order_step::messaging::QueueDispatcher;
//! use saga_order_step::steps::StepTaskHandler;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(payload: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let config = manager.config();
//! saga_order_step::logging::init_structured_logging(manager.environment(), &config.telemetry);
//!
//! let (dispatcher, _next_step_rx) = QueueDispatcher::channel(config.next_queue.clone(), 64);
//! let handler = StepTaskHandler::from_config(config, Arc::new(dispatcher))?;
//!
//! let outcome = handler
//!     .handle_perform_step_task(payload, &CancellationToken::new())
//!     .await;
//! if outcome.should_retry() {
//!     // hand back to the queue for another attempt
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod execution;
pub mod logging;
pub mod messaging;
pub mod resilience;
pub mod steps;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{ConfigManager, StepWorkerConfig};
pub use constants::{OrderStatus, SagaAction};
pub use error::{Outcome, StepError, StepResult};
pub use execution::TaskContext;
pub use messaging::StepPayload;
pub use resilience::{BreakerGate, CircuitBreaker, CircuitState};
pub use steps::StepTaskHandler;
