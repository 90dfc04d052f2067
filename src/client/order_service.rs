//! # Order Service Client
//!
//! HTTP client for the downstream order service. Transport failures (connect,
//! timeout, reset) classify as retryable; any unexpected status or body is a
//! terminal protocol error naming the order it concerns.

use crate::constants::OrderStatus;
use crate::error::{StepError, StepResult};
use crate::messaging::payload::Order;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Connection settings for the downstream order service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderServiceConfig {
    /// `host:port` of the order service, or a full base URL
    pub address: String,

    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for OrderServiceConfig {
    fn default() -> Self {
        Self {
            address: "localhost:8080".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

/// Result of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The order no longer exists; compensation already happened
    AlreadyAbsent,
}

/// Calls the step core makes against the downstream resource service
#[async_trait]
pub trait OrderService: Send + Sync + fmt::Debug {
    /// Service address this client talks to
    fn address(&self) -> &str;

    /// Create an order from an already-encoded step payload
    async fn create_order(&self, body: Vec<u8>) -> StepResult<Order>;

    /// Delete an order by id
    async fn delete_order(&self, order_id: u64) -> StepResult<DeleteOutcome>;

    /// Force an order into a terminal status
    async fn set_status(&self, order_id: u64, status: OrderStatus) -> StepResult<()>;
}

#[derive(Debug, Serialize)]
struct StatusUpdate {
    status: OrderStatus,
}

/// `reqwest`-backed order service client
#[derive(Clone)]
pub struct HttpOrderServiceClient {
    client: Client,
    address: String,
    base_url: String,
}

impl fmt::Debug for HttpOrderServiceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpOrderServiceClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpOrderServiceClient {
    pub fn new(config: &OrderServiceConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(format!("saga-order-step/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(client, &config.address))
    }

    /// Build around an existing `reqwest::Client`
    pub fn with_client(client: Client, address: &str) -> Self {
        let trimmed = address.trim_end_matches('/');
        let base_url = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };

        Self {
            client,
            address: address.to_string(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn order_url(&self, order_id: u64) -> String {
        format!("{}/{}", self.base_url, order_id)
    }
}

#[async_trait]
impl OrderService for HttpOrderServiceClient {
    fn address(&self) -> &str {
        &self.address
    }

    async fn create_order(&self, body: Vec<u8>) -> StepResult<Order> {
        debug!(url = %self.base_url, bytes = body.len(), "📤 Creating order");

        let response = self
            .client
            .post(&self.base_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| StepError::transport("create_order", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(StepError::protocol(
                "create_order",
                None,
                format!("unexpected status {status}: {text}"),
            ));
        }

        let order: Order = response
            .json()
            .await
            .map_err(|e| StepError::protocol("create_order", None, e.to_string()))?;

        info!(order_id = order.id, status = %status, "✅ Order created");
        Ok(order)
    }

    async fn delete_order(&self, order_id: u64) -> StepResult<DeleteOutcome> {
        debug!(order_id, "📤 Deleting order");

        let response = self
            .client
            .delete(self.order_url(order_id))
            .send()
            .await
            .map_err(|e| StepError::transport("delete_order", e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(DeleteOutcome::Deleted),
            StatusCode::NOT_FOUND => {
                warn!(order_id, "Order already absent, delete treated as no-op");
                Ok(DeleteOutcome::AlreadyAbsent)
            }
            status => Err(StepError::protocol(
                "delete_order",
                Some(order_id),
                format!("unexpected status {status}"),
            )),
        }
    }

    async fn set_status(&self, order_id: u64, status: OrderStatus) -> StepResult<()> {
        debug!(order_id, status = %status, "📤 Updating order status");

        let response = self
            .client
            .put(format!("{}/status", self.order_url(order_id)))
            .json(&StatusUpdate { status })
            .send()
            .await
            .map_err(|e| StepError::transport("set_status", e.to_string()))?;

        let code = response.status();
        if !code.is_success() {
            return Err(StepError::protocol(
                "set_status",
                Some(order_id),
                format!("unexpected status {code}"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_from_bare_address() {
        let client = HttpOrderServiceClient::with_client(Client::new(), "orders:8080");
        assert_eq!(client.base_url(), "http://orders:8080");
        assert_eq!(client.order_url(42), "http://orders:8080/42");
        assert_eq!(client.address(), "orders:8080");
    }

    #[test]
    fn test_base_url_keeps_explicit_scheme() {
        let client = HttpOrderServiceClient::with_client(Client::new(), "https://orders.local/");
        assert_eq!(client.base_url(), "https://orders.local");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let client = HttpOrderServiceClient::new(&OrderServiceConfig {
            address: "127.0.0.1:1".to_string(),
            request_timeout_ms: 500,
        })
        .unwrap();

        let error = client.create_order(b"{}".to_vec()).await.unwrap_err();
        assert_eq!(error.kind(), "TRANSPORT_ERROR");
        assert!(error.is_retryable());
    }
}
