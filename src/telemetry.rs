//! # Step Tracing
//!
//! One span per handler invocation, named `{queue}.{perform|revert}`. The
//! tracer is handed to each [`StepTaskHandler`](crate::steps::StepTaskHandler)
//! explicitly rather than pulled from a process-wide global. Span fields follow
//! the `otel.*` conventions so the OpenTelemetry layer installed by
//! [`logging`](crate::logging) exports names and statuses unchanged.
//!
//! A span's terminal status is recorded at most once; the first `mark_ok` or
//! `mark_failed` wins, so a late completion from an abandoned action can never
//! overwrite the observation the handler already made.

use crate::constants::{span_events, SagaAction};
use crate::error::StepError;
use crate::messaging::payload::StepPayload;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::field::Empty;
use tracing::{info, info_span, warn, Span};
use uuid::Uuid;

/// Terminal status of a step span
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanStatus {
    Unset,
    Ok,
    Error { kind: &'static str, message: String },
}

/// Creates step spans for one queue identity
#[derive(Debug, Clone)]
pub struct StepTracer {
    queue: String,
}

impl StepTracer {
    pub fn new(queue: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
        }
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn span_name(&self, action: SagaAction) -> String {
        format!("{}.{}", self.queue, action)
    }

    /// Open the span for one invocation
    pub fn start(&self, action: SagaAction, payload: &StepPayload, task_id: Uuid) -> StepSpan {
        let name = self.span_name(action);
        let span = info_span!(
            "saga_step",
            otel.name = %name,
            otel.kind = "consumer",
            otel.status_code = Empty,
            otel.status_message = Empty,
            saga.queue = %self.queue,
            saga.action = %action,
            task_id = %task_id,
            token_id = payload.token_id,
            user_id = payload.user_id,
            amount = payload.amount,
            order_id = Empty,
            error.kind = Empty,
        );
        if let Some(order_id) = payload.order_id() {
            span.record("order_id", order_id);
        }

        StepSpan {
            span,
            name,
            status: Arc::new(Mutex::new(SpanStatus::Unset)),
        }
    }
}

/// Handle to an invocation's span, shared with the action it runs
#[derive(Debug, Clone)]
pub struct StepSpan {
    span: Span,
    name: String,
    status: Arc<Mutex<SpanStatus>>,
}

impl StepSpan {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn status(&self) -> SpanStatus {
        self.status.lock().clone()
    }

    pub fn event(&self, event: &'static str) {
        info!(parent: &self.span, event, span_name = %self.name, "step event");
    }

    pub fn event_with(&self, event: &'static str, detail: &str) {
        info!(parent: &self.span, event, detail, span_name = %self.name, "step event");
    }

    pub fn record_order_id(&self, order_id: u64) {
        self.span.record("order_id", order_id);
    }

    /// Mark the span successful; returns false if a terminal status already exists
    pub fn mark_ok(&self) -> bool {
        let mut status = self.status.lock();
        if *status != SpanStatus::Unset {
            return false;
        }
        *status = SpanStatus::Ok;
        self.span.record("otel.status_code", "OK");
        info!(parent: &self.span, event = span_events::TERMINAL_OUTCOME, outcome = "ok", "step event");
        true
    }

    /// Mark the span failed; returns false if a terminal status already exists
    pub fn mark_failed(&self, error: &StepError) -> bool {
        let mut status = self.status.lock();
        if *status != SpanStatus::Unset {
            warn!(span_name = %self.name, error = %error, "Span already concluded, failure not recorded");
            return false;
        }
        let message = error.to_string();
        self.span.record("otel.status_code", "ERROR");
        self.span.record("otel.status_message", message.as_str());
        self.span.record("error.kind", error.kind());
        if let Some(order_id) = error.order_id() {
            self.span.record("order_id", order_id);
        }
        info!(
            parent: &self.span,
            event = span_events::TERMINAL_OUTCOME,
            outcome = "error",
            error = %error,
            retryable = error.is_retryable(),
            "step event"
        );
        *status = SpanStatus::Error {
            kind: error.kind(),
            message,
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_named_after_queue_and_action() {
        let tracer = StepTracer::new("order");
        assert_eq!(tracer.span_name(SagaAction::Perform), "order.perform");
        assert_eq!(tracer.span_name(SagaAction::Revert), "order.revert");

        let span = tracer.start(SagaAction::Revert, &StepPayload::default(), Uuid::new_v4());
        assert_eq!(span.name(), "order.revert");
        assert_eq!(span.status(), SpanStatus::Unset);
    }

    #[test]
    fn test_first_terminal_status_wins() {
        let tracer = StepTracer::new("order");
        let span = tracer.start(SagaAction::Perform, &StepPayload::default(), Uuid::new_v4());

        assert!(span.mark_failed(&StepError::Cancelled));
        assert!(!span.mark_ok());
        assert!(!span.clone().mark_failed(&StepError::decode("late")));

        assert_eq!(
            span.status(),
            SpanStatus::Error {
                kind: "CANCELLED",
                message: StepError::Cancelled.to_string(),
            }
        );
    }
}
