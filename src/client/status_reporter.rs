//! # Status Reporter
//!
//! Best-effort status updates against the downstream order. Used on every
//! compensation path so an order is never left in an ambiguous state; a failed
//! update is logged and never replaces the error that triggered it.
//!
//! The reporter itself does not watch for cancellation. Callers on the
//! admission path spawn it and race the join handle against their token.

use crate::client::order_service::OrderService;
use crate::constants::OrderStatus;
use crate::error::StepResult;
use crate::messaging::payload::StepPayload;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct StatusReporter {
    orders: Arc<dyn OrderService>,
}

impl StatusReporter {
    pub fn new(orders: Arc<dyn OrderService>) -> Self {
        Self { orders }
    }

    /// Mark an existing order; returns whether the update was accepted
    pub async fn report(&self, order_id: u64, status: OrderStatus) -> bool {
        match self.orders.set_status(order_id, status).await {
            Ok(()) => {
                info!(order_id, status = %status, "📝 Order status updated");
                true
            }
            Err(e) => {
                error!(
                    order_id,
                    status = %status,
                    error = %e,
                    "❌ Order status update failed"
                );
                false
            }
        }
    }

    /// Record a create that admission control rejected
    ///
    /// When the payload already addresses an order, that order is marked.
    /// Otherwise the rejected order is recorded downstream and immediately
    /// marked, so the requester observes a defaulted order rather than nothing.
    pub async fn report_rejected(&self, payload: &StepPayload, status: OrderStatus) -> Option<u64> {
        if let Some(order_id) = payload.order_id() {
            return self.report(order_id, status).await.then_some(order_id);
        }

        match self.record_rejected_order(payload).await {
            Ok(order_id) => self.report(order_id, status).await.then_some(order_id),
            Err(e) => {
                warn!(error = %e, status = %status, "Rejected order could not be recorded");
                None
            }
        }
    }

    async fn record_rejected_order(&self, payload: &StepPayload) -> StepResult<u64> {
        let order = self.orders.create_order(payload.encode()?).await?;
        Ok(order.id)
    }
}
