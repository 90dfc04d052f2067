//! In-memory collaborators for unit tests.

use crate::client::{DeleteOutcome, OrderService, StatusReporter};
use crate::constants::OrderStatus;
use crate::error::StepResult;
use crate::execution::TaskContext;
use crate::messaging::{NextStepDispatcher, NextStepPayload, Order};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig};
use crate::steps::StepTaskHandler;
use crate::telemetry::StepTracer;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Map;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub(crate) fn order(id: u64, token_id: u64, amount: u64) -> Order {
    Order {
        id,
        token_id,
        user_id: 3,
        amount,
        extra: Map::new(),
    }
}

#[derive(Debug)]
pub(crate) struct MockOrderService {
    create_response: Mutex<StepResult<Order>>,
    delete_response: Mutex<StepResult<DeleteOutcome>>,
    create_delay: Mutex<Option<Duration>>,
    creates: Mutex<Vec<Vec<u8>>>,
    completed_creates: AtomicUsize,
    deletes: Mutex<Vec<u64>>,
    status_updates: Mutex<Vec<(u64, OrderStatus)>>,
}

impl MockOrderService {
    pub(crate) fn new() -> Self {
        Self {
            create_response: Mutex::new(Ok(order(42, 7, 100))),
            delete_response: Mutex::new(Ok(DeleteOutcome::Deleted)),
            create_delay: Mutex::new(None),
            creates: Mutex::new(Vec::new()),
            completed_creates: AtomicUsize::new(0),
            deletes: Mutex::new(Vec::new()),
            status_updates: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn respond_create(&self, response: StepResult<Order>) {
        *self.create_response.lock() = response;
    }

    pub(crate) fn respond_delete(&self, response: StepResult<DeleteOutcome>) {
        *self.delete_response.lock() = response;
    }

    pub(crate) fn delay_create(&self, delay: Duration) {
        *self.create_delay.lock() = Some(delay);
    }

    pub(crate) fn creates(&self) -> usize {
        self.creates.lock().len()
    }

    pub(crate) fn completed_creates(&self) -> usize {
        self.completed_creates.load(Ordering::SeqCst)
    }

    pub(crate) fn deletes(&self) -> Vec<u64> {
        self.deletes.lock().clone()
    }

    pub(crate) fn status_updates(&self) -> Vec<(u64, OrderStatus)> {
        self.status_updates.lock().clone()
    }
}

#[async_trait]
impl OrderService for MockOrderService {
    fn address(&self) -> &str {
        "mock-orders:8080"
    }

    async fn create_order(&self, body: Vec<u8>) -> StepResult<Order> {
        self.creates.lock().push(body);
        let delay = *self.create_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.completed_creates.fetch_add(1, Ordering::SeqCst);
        self.create_response.lock().clone()
    }

    async fn delete_order(&self, order_id: u64) -> StepResult<DeleteOutcome> {
        self.deletes.lock().push(order_id);
        self.delete_response.lock().clone()
    }

    async fn set_status(&self, order_id: u64, status: OrderStatus) -> StepResult<()> {
        self.status_updates.lock().push((order_id, status));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingDispatcher {
    dispatched: Mutex<Vec<NextStepPayload>>,
}

impl RecordingDispatcher {
    pub(crate) fn dispatched(&self) -> Vec<NextStepPayload> {
        self.dispatched.lock().clone()
    }
}

#[async_trait]
impl NextStepDispatcher for RecordingDispatcher {
    async fn dispatch(&self, payload: NextStepPayload) -> StepResult<()> {
        self.dispatched.lock().push(payload);
        Ok(())
    }
}

/// Wires mocks, a real breaker, and a tracer for the `order` queue
pub(crate) struct StepHarness {
    pub(crate) orders: Arc<MockOrderService>,
    pub(crate) dispatcher: Arc<RecordingDispatcher>,
    pub(crate) breaker: Arc<CircuitBreaker>,
    pub(crate) tracer: StepTracer,
}

impl StepHarness {
    pub(crate) fn new() -> Self {
        Self {
            orders: Arc::new(MockOrderService::new()),
            dispatcher: Arc::new(RecordingDispatcher::default()),
            breaker: Arc::new(CircuitBreaker::new(
                "order.order_service",
                CircuitBreakerConfig {
                    failure_threshold: 3,
                    timeout_seconds: 60,
                    success_threshold: 1,
                },
            )),
            tracer: StepTracer::new("order"),
        }
    }

    pub(crate) fn context(&self) -> TaskContext {
        let task_id = Uuid::new_v4();
        TaskContext {
            task_id,
            server_queue: "order".to_string(),
            span: self.tracer.start(
                crate::constants::SagaAction::Perform,
                &Default::default(),
                task_id,
            ),
            orders: self.orders.clone(),
            status_reporter: StatusReporter::new(self.orders.clone()),
            breaker: self.breaker.clone(),
            dispatcher: self.dispatcher.clone(),
            fault_injection: None,
        }
    }

    pub(crate) fn handler(&self) -> StepTaskHandler {
        StepTaskHandler::new(
            "order",
            self.orders.clone(),
            self.breaker.clone(),
            self.dispatcher.clone(),
        )
        .with_tracer(self.tracer.clone())
    }
}
