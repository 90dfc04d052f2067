//! # Step Error Types
//!
//! Error taxonomy for the saga step core. Every variant carries its own retry
//! classification so the queue adapter never has to guess whether a failure is
//! transient or permanently doomed.

use crate::constants::OrderStatus;
use std::fmt;
use thiserror::Error;

/// Errors produced while decoding, admitting, or executing a saga step
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error("payload decode failed: {message}")]
    Decode { message: String },

    #[error("payload encode failed: {message}")]
    Encode { message: String },

    #[error("default response: circuit breaker {breaker} is {state}")]
    AdmissionRejected { breaker: String, state: String },

    #[error("transport error during {operation}: {message}")]
    Transport { operation: String, message: String },

    #[error("protocol error during {operation} for order {}: {message}", display_order_id(.order_id))]
    Protocol {
        operation: String,
        order_id: Option<u64>,
        message: String,
    },

    #[error("injected failure on queue {queue}: order {order_id} marked {status}")]
    InjectedFailure {
        queue: String,
        order_id: u64,
        status: OrderStatus,
    },

    #[error("next step dispatch to {queue} failed: {message}")]
    Dispatch { queue: String, message: String },

    #[error("task cancelled before the action completed")]
    Cancelled,

    #[error("action ended without reporting a result: {message}")]
    ActionAborted { message: String },
}

fn display_order_id(order_id: &Option<u64>) -> String {
    match order_id {
        Some(id) => id.to_string(),
        None => "<unassigned>".to_string(),
    }
}

impl StepError {
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    pub fn admission_rejected(breaker: impl Into<String>, state: impl Into<String>) -> Self {
        Self::AdmissionRejected {
            breaker: breaker.into(),
            state: state.into(),
        }
    }

    pub fn transport(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn protocol(
        operation: impl Into<String>,
        order_id: Option<u64>,
        message: impl Into<String>,
    ) -> Self {
        Self::Protocol {
            operation: operation.into(),
            order_id,
            message: message.into(),
        }
    }

    pub fn injected_failure(queue: impl Into<String>, order_id: u64, status: OrderStatus) -> Self {
        Self::InjectedFailure {
            queue: queue.into(),
            order_id,
            status,
        }
    }

    pub fn dispatch(queue: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Dispatch {
            queue: queue.into(),
            message: message.into(),
        }
    }

    pub fn action_aborted(message: impl Into<String>) -> Self {
        Self::ActionAborted {
            message: message.into(),
        }
    }

    /// Whether the queue should re-attempt the task after this error
    pub fn is_retryable(&self) -> bool {
        match self {
            StepError::Transport { .. } => true,
            StepError::Dispatch { .. } => true,
            StepError::Cancelled => true,
            StepError::Decode { .. } => false,
            StepError::Encode { .. } => false,
            StepError::AdmissionRejected { .. } => false,
            StepError::Protocol { .. } => false,
            StepError::InjectedFailure { .. } => false,
            StepError::ActionAborted { .. } => false,
        }
    }

    /// Queue-facing "skip retry" marker; terminal errors are dead-lettered immediately
    pub fn skip_retry(&self) -> bool {
        !self.is_retryable()
    }

    /// Stable classification label for logs and span attributes
    pub fn kind(&self) -> &'static str {
        match self {
            StepError::Decode { .. } => "DECODE_ERROR",
            StepError::Encode { .. } => "ENCODE_ERROR",
            StepError::AdmissionRejected { .. } => "ADMISSION_REJECTED",
            StepError::Transport { .. } => "TRANSPORT_ERROR",
            StepError::Protocol { .. } => "PROTOCOL_ERROR",
            StepError::InjectedFailure { .. } => "INJECTED_FAILURE",
            StepError::Dispatch { .. } => "DISPATCH_ERROR",
            StepError::Cancelled => "CANCELLED",
            StepError::ActionAborted { .. } => "ACTION_ABORTED",
        }
    }

    /// Order id an error refers to, when it names one
    pub fn order_id(&self) -> Option<u64> {
        match self {
            StepError::Protocol { order_id, .. } => *order_id,
            StepError::InjectedFailure { order_id, .. } => Some(*order_id),
            _ => None,
        }
    }
}

pub type StepResult<T> = std::result::Result<T, StepError>;

/// Tri-state result of one handler invocation as seen by the queue
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success,
    /// Transient failure; the queue re-attempts per its own backoff
    RetryableFailure(StepError),
    /// Malformed or unrecoverable; the queue must not retry
    TerminalFailure(StepError),
}

impl Outcome {
    pub fn from_result(result: StepResult<()>) -> Self {
        match result {
            Ok(()) => Outcome::Success,
            Err(error) if error.is_retryable() => Outcome::RetryableFailure(error),
            Err(error) => Outcome::TerminalFailure(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn should_retry(&self) -> bool {
        matches!(self, Outcome::RetryableFailure(_))
    }

    pub fn error(&self) -> Option<&StepError> {
        match self {
            Outcome::Success => None,
            Outcome::RetryableFailure(error) | Outcome::TerminalFailure(error) => Some(error),
        }
    }

    /// Convert back into the queue boundary shape: `Ok` or an error whose
    /// `skip_retry()` tells the queue whether to dead-letter
    pub fn into_result(self) -> StepResult<()> {
        match self {
            Outcome::Success => Ok(()),
            Outcome::RetryableFailure(error) | Outcome::TerminalFailure(error) => Err(error),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::RetryableFailure(error) => write!(f, "retryable failure: {error}"),
            Outcome::TerminalFailure(error) => write!(f, "terminal failure: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors_are_retryable() {
        assert!(StepError::transport("create", "connection refused").is_retryable());
        assert!(StepError::Cancelled.is_retryable());
        assert!(StepError::dispatch("next", "channel closed").is_retryable());
    }

    #[test]
    fn test_terminal_errors_skip_retry() {
        assert!(StepError::decode("bad json").skip_retry());
        assert!(StepError::admission_rejected("orders", "open").skip_retry());
        assert!(StepError::protocol("delete", Some(42), "status 500").skip_retry());
        assert!(StepError::injected_failure("q1", 42, OrderStatus::ForcedFail).skip_retry());
    }

    #[test]
    fn test_protocol_error_names_order() {
        let error = StepError::protocol("delete", Some(42), "unexpected status 500");
        assert!(error.to_string().contains("order 42"));
        assert_eq!(error.order_id(), Some(42));

        let unassigned = StepError::protocol("create", None, "bad body");
        assert!(unassigned.to_string().contains("<unassigned>"));
    }

    #[test]
    fn test_outcome_classification() {
        assert_eq!(Outcome::from_result(Ok(())), Outcome::Success);

        let retry = Outcome::from_result(Err(StepError::transport("create", "reset")));
        assert!(retry.should_retry());

        let terminal = Outcome::from_result(Err(StepError::decode("eof")));
        assert!(!terminal.should_retry());
        assert_eq!(terminal.error().map(StepError::kind), Some("DECODE_ERROR"));
        assert!(terminal.into_result().is_err());
    }
}
