//! # Saga Step Constants
//!
//! Shared enumerations and names used across the step core: which branch of the
//! action pair runs, which status the downstream order can be forced into, and
//! the event names recorded on every step span.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which branch of the action pair a task executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SagaAction {
    /// Forward action: create the order
    Perform,
    /// Compensating action: fail and delete the order
    Revert,
}

impl SagaAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaAction::Perform => "perform",
            SagaAction::Revert => "revert",
        }
    }
}

impl fmt::Display for SagaAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SagaAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "perform" => Ok(SagaAction::Perform),
            "revert" => Ok(SagaAction::Revert),
            other => Err(format!("unknown saga action: {other}")),
        }
    }
}

/// Terminal statuses the step core may force onto a downstream order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "FAIL")]
    Fail,
    #[serde(rename = "DEFAULT_RESPONSE")]
    DefaultResponse,
    #[serde(rename = "FORCED_FAIL")]
    ForcedFail,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Fail => "FAIL",
            OrderStatus::DefaultResponse => "DEFAULT_RESPONSE",
            OrderStatus::ForcedFail => "FORCED_FAIL",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FAIL" => Ok(OrderStatus::Fail),
            "DEFAULT_RESPONSE" => Ok(OrderStatus::DefaultResponse),
            "FORCED_FAIL" => Ok(OrderStatus::ForcedFail),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// Event names recorded on step spans
pub mod span_events {
    pub const ADMISSION_CHECK: &str = "admission_check";
    pub const PRE_REQUEST: &str = "pre_request";
    pub const POST_REQUEST: &str = "post_request";
    pub const BREAKER_STATE: &str = "breaker_state";
    pub const TERMINAL_OUTCOME: &str = "terminal_outcome";
}

/// Task type names understood by the queue adapter
pub mod task_types {
    pub const PERFORM_STEP: &str = "step:perform";
    pub const REVERT_STEP: &str = "step:revert";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saga_action_parsing() {
        assert_eq!("perform".parse::<SagaAction>(), Ok(SagaAction::Perform));
        assert_eq!("REVERT".parse::<SagaAction>(), Ok(SagaAction::Revert));
        assert!("err".parse::<SagaAction>().is_err());
    }

    #[test]
    fn test_order_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::DefaultResponse).unwrap(),
            "\"DEFAULT_RESPONSE\""
        );
        assert_eq!(OrderStatus::ForcedFail.to_string(), "FORCED_FAIL");
        assert_eq!("fail".parse::<OrderStatus>(), Ok(OrderStatus::Fail));
    }
}
