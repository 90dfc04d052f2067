//! # Next-Step Dispatcher
//!
//! Hands the successful perform's output to the next saga step. The queue
//! itself is external; `QueueDispatcher` enqueues onto a tokio channel that the
//! queue adapter drains into its own transport.

use crate::constants::task_types;
use crate::error::{StepError, StepResult};
use crate::messaging::payload::NextStepPayload;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Encoded task bound for a queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedTask {
    pub task_id: Uuid,
    pub queue: String,
    pub task_type: String,
    pub payload: Vec<u8>,
    pub enqueued_at: DateTime<Utc>,
}

/// Receives the next step's payload; invoked only after a successful perform
#[async_trait]
pub trait NextStepDispatcher: Send + Sync + fmt::Debug {
    async fn dispatch(&self, payload: NextStepPayload) -> StepResult<()>;
}

/// Dispatcher that enqueues perform tasks for the next step's queue
#[derive(Debug, Clone)]
pub struct QueueDispatcher {
    next_queue: String,
    sender: mpsc::Sender<QueuedTask>,
}

impl QueueDispatcher {
    pub fn new(next_queue: impl Into<String>, sender: mpsc::Sender<QueuedTask>) -> Self {
        Self {
            next_queue: next_queue.into(),
            sender,
        }
    }

    /// Create a dispatcher with its own bounded channel
    pub fn channel(
        next_queue: impl Into<String>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<QueuedTask>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self::new(next_queue, sender), receiver)
    }

    pub fn next_queue(&self) -> &str {
        &self.next_queue
    }
}

#[async_trait]
impl NextStepDispatcher for QueueDispatcher {
    async fn dispatch(&self, payload: NextStepPayload) -> StepResult<()> {
        let task = QueuedTask {
            task_id: Uuid::new_v4(),
            queue: self.next_queue.clone(),
            task_type: task_types::PERFORM_STEP.to_string(),
            payload: payload.encode()?,
            enqueued_at: Utc::now(),
        };

        debug!(
            task_id = %task.task_id,
            queue = %task.queue,
            order_id = payload.order_id,
            "📤 Enqueuing next step"
        );

        self.sender
            .send(task)
            .await
            .map_err(|e| StepError::dispatch(&self.next_queue, e.to_string()))?;

        info!(
            queue = %self.next_queue,
            order_id = payload.order_id,
            "✅ Next step enqueued"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SagaAction;

    fn next_payload() -> NextStepPayload {
        NextStepPayload {
            action: SagaAction::Perform,
            token_id: 7,
            user_id: 3,
            username: "alice".to_string(),
            amount: 100,
            order_id: 42,
        }
    }

    #[tokio::test]
    async fn test_dispatch_enqueues_perform_task() {
        let (dispatcher, mut receiver) = QueueDispatcher::channel("payment", 4);
        dispatcher.dispatch(next_payload()).await.unwrap();

        let task = receiver.recv().await.unwrap();
        assert_eq!(task.queue, "payment");
        assert_eq!(task.task_type, task_types::PERFORM_STEP);

        let decoded: NextStepPayload = serde_json::from_slice(&task.payload).unwrap();
        assert_eq!(decoded.order_id, 42);
    }

    #[tokio::test]
    async fn test_dispatch_to_closed_queue_is_retryable() {
        let (dispatcher, receiver) = QueueDispatcher::channel("payment", 1);
        drop(receiver);

        let error = dispatcher.dispatch(next_payload()).await.unwrap_err();
        assert_eq!(error.kind(), "DISPATCH_ERROR");
        assert!(error.is_retryable());
    }
}
