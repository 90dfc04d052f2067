//! Circuit breaker counters.

use crate::resilience::CircuitState;
use serde::{Deserialize, Serialize};

/// Snapshot of breaker feedback counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerMetrics {
    pub success_count: u64,
    pub failure_count: u64,
    pub consecutive_failures: u64,
    pub half_open_successes: u64,
    pub times_opened: u64,
    pub current_state: CircuitState,
}

impl CircuitBreakerMetrics {
    pub fn new() -> Self {
        Self {
            success_count: 0,
            failure_count: 0,
            consecutive_failures: 0,
            half_open_successes: 0,
            times_opened: 0,
            current_state: CircuitState::Closed,
        }
    }

    pub fn total_feedback(&self) -> u64 {
        self.success_count + self.failure_count
    }

    pub fn failure_rate(&self) -> f64 {
        let total = self.total_feedback();
        if total == 0 {
            0.0
        } else {
            self.failure_count as f64 / total as f64
        }
    }
}

impl Default for CircuitBreakerMetrics {
    fn default() -> Self {
        Self::new()
    }
}
