//! Circuit breaker thresholds.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Thresholds for the default circuit breaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,

    /// Seconds the circuit stays open before probing recovery
    pub timeout_seconds: u64,

    /// Successes in half-open required to close again
    pub success_threshold: u32,
}

impl CircuitBreakerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout_seconds: 30,
            success_threshold: 2,
        }
    }
}
