//! # Resilience Module
//!
//! Admission control for the downstream order service. The step core reads the
//! breaker's admission state before perform and feeds back every conclusive
//! failure; it never touches the breaker's counters directly.
//!
//! ## Usage
//!
//! ```rust
//! use saga_order_step::resilience::{BreakerGate, CircuitBreaker, CircuitBreakerConfig};
//!
//! let breaker = CircuitBreaker::new("order_service", CircuitBreakerConfig::default());
//! assert!(breaker.is_admitting());
//!
//! breaker.record_failure();
//! assert!(breaker.is_state("closed"));
//! ```

pub mod circuit_breaker;
pub mod config;
pub mod metrics;

pub use circuit_breaker::{BreakerGate, CircuitBreaker, CircuitState};
pub use config::CircuitBreakerConfig;
pub use metrics::CircuitBreakerMetrics;
