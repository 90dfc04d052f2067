//! # Task Context
//!
//! Per-invocation bindings handed to perform and revert. A context is built for
//! each dispatch and dropped when the handler returns; an abandoned action keeps
//! its own clone alive until it finishes.

use crate::client::{OrderService, StatusReporter};
use crate::config::FaultInjectionConfig;
use crate::constants::OrderStatus;
use crate::messaging::NextStepDispatcher;
use crate::resilience::BreakerGate;
use crate::telemetry::StepSpan;
use std::sync::Arc;
use uuid::Uuid;

/// Deterministic failure trigger for one queue partition
///
/// Only obtainable from a valid test-mode [`FaultInjectionConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultInjection {
    queue: String,
    status: OrderStatus,
}

impl FaultInjection {
    /// Marker for `queue`, only when a valid test-mode config targets it
    pub fn from_config(config: &FaultInjectionConfig, queue: &str) -> Option<Self> {
        if !config.targets(queue) || config.validate().is_err() {
            return None;
        }
        Some(Self {
            queue: queue.to_string(),
            status: config.status,
        })
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }
}

#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Invocation id for log correlation
    pub task_id: Uuid,

    /// Queue (partition) that delivered this task
    pub server_queue: String,

    pub span: StepSpan,

    pub orders: Arc<dyn OrderService>,

    pub status_reporter: StatusReporter,

    pub breaker: Arc<dyn BreakerGate>,

    pub dispatcher: Arc<dyn NextStepDispatcher>,

    pub fault_injection: Option<FaultInjection>,
}

impl TaskContext {
    /// Downstream order service address
    pub fn order_service_addr(&self) -> &str {
        self.orders.address()
    }

    /// Record the breaker's current state on the span
    pub fn add_span_state_event(&self) {
        let state = self.breaker.state();
        self.span
            .event_with(crate::constants::span_events::BREAKER_STATE, state.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_injection_only_for_targeted_queue_in_test_mode() {
        let mut config = FaultInjectionConfig {
            test_mode: false,
            force_fail_queues: vec!["order".to_string()],
            status: OrderStatus::DefaultResponse,
        };
        assert_eq!(FaultInjection::from_config(&config, "order"), None);

        config.test_mode = true;
        let fault = FaultInjection::from_config(&config, "order").unwrap();
        assert_eq!(fault.queue(), "order");
        assert_eq!(fault.status(), OrderStatus::DefaultResponse);
        assert_eq!(FaultInjection::from_config(&config, "payment"), None);
    }

    #[test]
    fn test_fault_injection_refuses_invalid_config() {
        let config = FaultInjectionConfig {
            test_mode: true,
            force_fail_queues: vec!["order".to_string()],
            status: OrderStatus::Fail,
        };
        assert_eq!(FaultInjection::from_config(&config, "order"), None);
    }
}
