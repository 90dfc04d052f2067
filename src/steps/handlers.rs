//! # Step Task Handlers
//!
//! Entry points invoked by the queue. Each invocation walks the same sequence:
//!
//! 1. decode the payload (failure is terminal, no network call)
//! 2. open the `{queue}.{action}` span
//! 3. perform only: consult breaker admission; a rejection short-circuits to a
//!    default response and still updates the order's status, with the update
//!    raced against cancellation the same way actions are
//! 4. run the selected action through the cancellation-aware executor
//! 5. feed a conclusive failure back to the breaker and fail the span, or mark
//!    the span ok
//!
//! Breaker feedback and span status are settled before the handler returns, so
//! each invocation leaves exactly one terminal observation.

use crate::client::{HttpOrderServiceClient, OrderService, StatusReporter};
use crate::config::{ConfigResult, ConfigurationError, FaultInjectionConfig, StepWorkerConfig};
use crate::constants::{span_events, task_types, OrderStatus, SagaAction};
use crate::error::{Outcome, StepError, StepResult};
use crate::execution::{execute_cancellable, FaultInjection, TaskContext};
use crate::logging::log_error;
use crate::messaging::{NextStepDispatcher, StepPayload};
use crate::resilience::{BreakerGate, CircuitBreaker, CircuitState};
use crate::steps::actions::action_for;
use crate::telemetry::{StepSpan, StepTracer};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn, Instrument};
use uuid::Uuid;

/// Shared dependencies for every invocation on one queue
#[derive(Debug, Clone)]
pub struct StepTaskHandler {
    server_queue: String,
    tracer: StepTracer,
    orders: Arc<dyn OrderService>,
    status_reporter: StatusReporter,
    breaker: Arc<dyn BreakerGate>,
    dispatcher: Arc<dyn NextStepDispatcher>,
    fault_injection: Option<FaultInjection>,
}

impl StepTaskHandler {
    pub fn new(
        server_queue: impl Into<String>,
        orders: Arc<dyn OrderService>,
        breaker: Arc<dyn BreakerGate>,
        dispatcher: Arc<dyn NextStepDispatcher>,
    ) -> Self {
        let server_queue = server_queue.into();
        Self {
            tracer: StepTracer::new(server_queue.clone()),
            status_reporter: StatusReporter::new(orders.clone()),
            server_queue,
            orders,
            breaker,
            dispatcher,
            fault_injection: None,
        }
    }

    /// Build from loaded configuration with the HTTP client and default breaker
    pub fn from_config(
        config: &StepWorkerConfig,
        dispatcher: Arc<dyn NextStepDispatcher>,
    ) -> ConfigResult<Self> {
        let orders = HttpOrderServiceClient::new(&config.order_service).map_err(|e| {
            ConfigurationError::component_build("order service client", e.to_string())
        })?;
        let breaker = CircuitBreaker::new(
            format!("{}.order_service", config.server_queue),
            config.circuit_breaker.clone(),
        );

        let handler = Self::new(
            config.server_queue.clone(),
            Arc::new(orders),
            Arc::new(breaker),
            dispatcher,
        )
        .with_fault_injection(&config.fault_injection);
        Ok(handler)
    }

    /// Replace the tracer used to open invocation spans
    pub fn with_tracer(mut self, tracer: StepTracer) -> Self {
        self.tracer = tracer;
        self
    }

    /// Arm fault injection when `config` is in test mode and targets this queue
    pub fn with_fault_injection(mut self, config: &FaultInjectionConfig) -> Self {
        let fault_injection = FaultInjection::from_config(config, &self.server_queue);
        if let Some(fault) = &fault_injection {
            warn!(
                queue = %fault.queue(),
                status = %fault.status(),
                "🧪 Fault injection armed for this queue"
            );
        }
        self.fault_injection = fault_injection;
        self
    }

    pub fn server_queue(&self) -> &str {
        &self.server_queue
    }

    pub fn breaker(&self) -> &Arc<dyn BreakerGate> {
        &self.breaker
    }

    /// Perform task entry point
    pub async fn handle_perform_step_task(
        &self,
        payload: &[u8],
        cancel: &CancellationToken,
    ) -> Outcome {
        self.handle(SagaAction::Perform, payload, cancel).await
    }

    /// Revert task entry point
    pub async fn handle_revert_step_task(
        &self,
        payload: &[u8],
        cancel: &CancellationToken,
    ) -> Outcome {
        self.handle(SagaAction::Revert, payload, cancel).await
    }

    /// Route by queue task type name
    pub async fn handle_task(
        &self,
        task_type: &str,
        payload: &[u8],
        cancel: &CancellationToken,
    ) -> Outcome {
        match task_type {
            task_types::PERFORM_STEP => self.handle_perform_step_task(payload, cancel).await,
            task_types::REVERT_STEP => self.handle_revert_step_task(payload, cancel).await,
            other => self.reject_undecodable(
                None,
                StepError::decode(format!("unknown task type: {other}")),
            ),
        }
    }

    /// Route by the action tag carried inside the payload
    pub async fn handle_tagged(&self, payload: &[u8], cancel: &CancellationToken) -> Outcome {
        let decoded = match StepPayload::decode(payload) {
            Ok(decoded) => decoded,
            Err(e) => return self.reject_undecodable(None, e),
        };
        match decoded.action {
            Some(action) => self.run(action, decoded, cancel).await,
            None => self.reject_undecodable(
                None,
                StepError::decode("payload has no recognised action tag"),
            ),
        }
    }

    /// Handle one invocation of `action`
    pub async fn handle(
        &self,
        action: SagaAction,
        payload: &[u8],
        cancel: &CancellationToken,
    ) -> Outcome {
        match StepPayload::decode(payload) {
            Ok(decoded) => self.run(action, decoded, cancel).await,
            Err(e) => self.reject_undecodable(Some(action), e),
        }
    }

    #[instrument(skip_all, fields(queue = %self.server_queue, action = %action))]
    async fn run(
        &self,
        action: SagaAction,
        payload: StepPayload,
        cancel: &CancellationToken,
    ) -> Outcome {
        let task_id = Uuid::new_v4();
        let span = self.tracer.start(action, &payload, task_id);
        let context = self.task_context(task_id, span.clone());

        if action == SagaAction::Perform {
            if let Err(rejection) = self.check_admission(&payload, &span, cancel).await {
                return Outcome::from_result(Err(rejection));
            }
        }

        let result = execute_cancellable(action_for(action), payload, context.clone(), cancel)
            .instrument(span.span().clone())
            .await;

        context.add_span_state_event();
        self.conclude(&span, task_id, result)
    }

    /// Admission gate for perform; on rejection the order is marked
    /// DEFAULT_RESPONSE and the span concluded before returning
    ///
    /// The verdict comes from a single state snapshot, the same one recorded
    /// on the span. The default response update is raced against `cancel`
    /// like an action: cancellation abandons the wait and the update still
    /// lands in the background.
    async fn check_admission(
        &self,
        payload: &StepPayload,
        span: &StepSpan,
        cancel: &CancellationToken,
    ) -> StepResult<()> {
        let state = self.breaker.state();
        span.event_with(span_events::ADMISSION_CHECK, state.as_str());

        if state != CircuitState::Open {
            return Ok(());
        }

        warn!(
            breaker = %self.breaker.name(),
            state = %state,
            "⚡ Circuit breaker rejecting, returning default response"
        );

        let reporter = self.status_reporter.clone();
        let rejected = payload.clone();
        let report = tokio::spawn(
            async move {
                reporter
                    .report_rejected(&rejected, OrderStatus::DefaultResponse)
                    .await
            }
            .instrument(span.span().clone()),
        );

        let order_id = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(
                    breaker = %self.breaker.name(),
                    "🛑 Cancellation received, abandoning wait on default response update"
                );
                None
            }
            joined = report => joined.unwrap_or_else(|e| {
                warn!(error = %e, "Default response update ended without a result");
                None
            }),
        };
        if let Some(order_id) = order_id {
            span.record_order_id(order_id);
        }

        let rejection = StepError::admission_rejected(self.breaker.name(), state.as_str());
        span.mark_failed(&rejection);
        Err(rejection)
    }

    fn conclude(&self, span: &StepSpan, task_id: Uuid, result: StepResult<()>) -> Outcome {
        match &result {
            Ok(()) => {
                span.mark_ok();
                info!(%task_id, span = %span.name(), "✅ Step succeeded");
            }
            Err(e) => {
                self.breaker.record_failure();
                span.mark_failed(e);
                error!(
                    %task_id,
                    span = %span.name(),
                    error = %e,
                    kind = e.kind(),
                    retryable = e.is_retryable(),
                    "❌ Step failed"
                );
            }
        }
        Outcome::from_result(result)
    }

    fn reject_undecodable(&self, action: Option<SagaAction>, error: StepError) -> Outcome {
        let operation = action.map(|a| a.as_str()).unwrap_or("dispatch");
        log_error(
            &self.server_queue,
            operation,
            &error.to_string(),
            Some("payload rejected before any network call"),
        );
        Outcome::from_result(Err(error))
    }

    fn task_context(&self, task_id: Uuid, span: StepSpan) -> TaskContext {
        TaskContext {
            task_id,
            server_queue: self.server_queue.clone(),
            span,
            orders: self.orders.clone(),
            status_reporter: self.status_reporter.clone(),
            breaker: self.breaker.clone(),
            dispatcher: self.dispatcher.clone(),
            fault_injection: self.fault_injection.clone(),
        }
    }
}
