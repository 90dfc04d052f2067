//! Shared wiring for integration tests against a mock order service.

#![allow(dead_code)]

use saga_order_step::client::{HttpOrderServiceClient, OrderServiceConfig};
use saga_order_step::messaging::{QueueDispatcher, QueuedTask};
use saga_order_step::resilience::{CircuitBreaker, CircuitBreakerConfig};
use saga_order_step::steps::StepTaskHandler;
use std::sync::Arc;
use tokio::sync::mpsc;
use wiremock::MockServer;

pub struct StepWorker {
    pub handler: StepTaskHandler,
    pub breaker: Arc<CircuitBreaker>,
    pub next_steps: mpsc::Receiver<QueuedTask>,
}

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("saga_order_step=debug")
        .with_test_writer()
        .try_init();
}

/// Handler for the `order` queue talking to `address`
pub fn step_worker(address: &str) -> StepWorker {
    init_test_logging();

    let orders = HttpOrderServiceClient::new(&OrderServiceConfig {
        address: address.to_string(),
        request_timeout_ms: 2_000,
    })
    .expect("http client");
    let breaker = Arc::new(CircuitBreaker::new(
        "order.order_service",
        CircuitBreakerConfig {
            failure_threshold: 3,
            timeout_seconds: 60,
            success_threshold: 1,
        },
    ));
    let (dispatcher, next_steps) = QueueDispatcher::channel("payment", 8);

    let handler = StepTaskHandler::new(
        "order",
        Arc::new(orders),
        breaker.clone(),
        Arc::new(dispatcher),
    );

    StepWorker {
        handler,
        breaker,
        next_steps,
    }
}

pub async fn mock_order_service() -> MockServer {
    MockServer::start().await
}
