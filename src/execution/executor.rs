//! # Cancellation-Aware Executor
//!
//! Runs an action on its own task and waits for whichever comes first: the
//! action's result or the cancellation signal. Cancellation abandons the wait;
//! it never aborts the action, whose downstream side effects may still land
//! after the handler has reported.

use crate::error::{StepError, StepResult};
use crate::execution::TaskContext;
use crate::messaging::StepPayload;
use std::future::Future;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Instrument};

/// Run `action` against the payload and context, racing it against `cancel`
pub async fn execute_cancellable<A, Fut>(
    action: A,
    payload: StepPayload,
    context: TaskContext,
    cancel: &CancellationToken,
) -> StepResult<()>
where
    A: FnOnce(StepPayload, TaskContext) -> Fut,
    Fut: Future<Output = StepResult<()>> + Send + 'static,
{
    if cancel.is_cancelled() {
        debug!(task_id = %context.task_id, "Cancelled before the action started");
        return Err(StepError::Cancelled);
    }

    let task_id = context.task_id;
    let span = context.span.span().clone();

    // Buffered by one so a completion after cancellation never blocks the action
    let (result_tx, mut result_rx) = mpsc::channel::<StepResult<()>>(1);
    let action_future = action(payload, context);

    tokio::spawn(async move {
        let result = action_future.await;
        if result_tx.send(result).await.is_err() {
            debug!(%task_id, "Action finished after its handler stopped waiting");
        }
    }
    .instrument(span));

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            warn!(%task_id, "🛑 Cancellation received, abandoning wait on action");
            Err(StepError::Cancelled)
        }
        result = result_rx.recv() => match result {
            Some(result) => result,
            None => Err(StepError::action_aborted("action task ended before sending its result")),
        },
    }
}
