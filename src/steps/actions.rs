//! # Action Pair
//!
//! The forward action creates the order and hands the result to the next saga
//! step; the compensating action marks the order failed and deletes it. Both
//! share one `(payload, context) -> result` signature so handlers select them
//! by [`SagaAction`] instead of branching inside a single function.

use crate::client::DeleteOutcome;
use crate::constants::{span_events, OrderStatus, SagaAction};
use crate::error::{StepError, StepResult};
use crate::execution::TaskContext;
use crate::logging::log_step_operation;
use crate::messaging::{NextStepPayload, StepPayload};
use futures::future::BoxFuture;
use tracing::{debug, info, warn};

/// One side of the action pair
pub type StepAction = fn(StepPayload, TaskContext) -> BoxFuture<'static, StepResult<()>>;

/// Select the action for a saga tag
pub fn action_for(action: SagaAction) -> StepAction {
    match action {
        SagaAction::Perform => perform,
        SagaAction::Revert => revert,
    }
}

pub fn perform(payload: StepPayload, context: TaskContext) -> BoxFuture<'static, StepResult<()>> {
    Box::pin(perform_order(payload, context))
}

pub fn revert(payload: StepPayload, context: TaskContext) -> BoxFuture<'static, StepResult<()>> {
    Box::pin(revert_order(payload, context))
}

async fn perform_order(mut payload: StepPayload, context: TaskContext) -> StepResult<()> {
    let body = payload.encode()?;

    context.span.event(span_events::PRE_REQUEST);
    debug!(
        task_id = %context.task_id,
        address = %context.order_service_addr(),
        "Creating order"
    );
    let order = context.orders.create_order(body).await?;
    context.span.event(span_events::POST_REQUEST);

    if order.id == 0 {
        return Err(StepError::protocol(
            "create_order",
            None,
            "response carried no order id",
        ));
    }

    payload.order_id = Some(order.id);
    context.span.record_order_id(order.id);
    log_step_operation(
        "perform",
        &context.server_queue,
        context.task_id,
        payload.order_id(),
        "order_created",
        None,
    );

    if let Some(fault) = &context.fault_injection {
        warn!(
            queue = %fault.queue(),
            order_id = order.id,
            status = %fault.status(),
            "🧪 Fault injection: forcing perform to fail"
        );
        context.status_reporter.report(order.id, fault.status()).await;
        return Err(StepError::injected_failure(
            fault.queue(),
            order.id,
            fault.status(),
        ));
    }

    let next = NextStepPayload::from_order(&order, payload.username.clone());
    context.dispatcher.dispatch(next).await?;

    info!(
        task_id = %context.task_id,
        order_id = order.id,
        token_id = order.token_id,
        amount = order.amount,
        "✅ Perform completed"
    );
    Ok(())
}

async fn revert_order(payload: StepPayload, context: TaskContext) -> StepResult<()> {
    let Some(order_id) = payload.order_id() else {
        info!(
            task_id = %context.task_id,
            "No order id on payload, nothing to compensate"
        );
        context
            .span
            .event_with(span_events::POST_REQUEST, "no order to compensate");
        return Ok(());
    };

    context.span.record_order_id(order_id);
    info!(task_id = %context.task_id, order_id, "↩️ Reverting order");

    context.status_reporter.report(order_id, OrderStatus::Fail).await;

    context.span.event(span_events::PRE_REQUEST);
    let outcome = context.orders.delete_order(order_id).await?;
    let detail = match outcome {
        DeleteOutcome::Deleted => "deleted",
        DeleteOutcome::AlreadyAbsent => "already absent",
    };
    context.span.event_with(span_events::POST_REQUEST, detail);

    log_step_operation(
        "revert",
        &context.server_queue,
        context.task_id,
        Some(order_id),
        "order_compensated",
        Some(detail),
    );
    Ok(())
}
