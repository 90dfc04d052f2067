//! # Downstream Clients
//!
//! The order service client and the status reporter layered on top of it.

pub mod order_service;
pub mod status_reporter;

pub use order_service::{DeleteOutcome, HttpOrderServiceClient, OrderService, OrderServiceConfig};
pub use status_reporter::StatusReporter;
