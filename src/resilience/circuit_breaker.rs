//! # Circuit Breaker Implementation
//!
//! The step core consumes a breaker only through [`BreakerGate`]: an admission
//! query by state name and a failure-feedback call. [`CircuitBreaker`] is the
//! default gate, a classic three-state breaker: Closed (normal operation), Open
//! (failing fast), and Half-Open (probing recovery).

use crate::resilience::{CircuitBreakerConfig, CircuitBreakerMetrics};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Circuit breaker states representing the current admission verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation - all calls are admitted
    Closed,
    /// Failure mode - new calls are rejected
    Open,
    /// Testing recovery - calls admitted until a verdict is reached
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half-open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract the step core requires from a circuit breaker
///
/// Implementations are shared across concurrent invocations and own their
/// synchronization; callers never lock breaker state directly.
pub trait BreakerGate: Send + Sync + fmt::Debug {
    /// Component name for logs and error messages
    fn name(&self) -> &str;

    /// Current admission state
    fn state(&self) -> CircuitState;

    /// Admission query by state name (`"open"`, `"closed"`, `"half-open"`)
    fn is_state(&self, state_name: &str) -> bool {
        self.state().as_str().eq_ignore_ascii_case(state_name)
    }

    /// Whether new calls are currently admitted
    fn is_admitting(&self) -> bool {
        !self.is_state(CircuitState::Open.as_str())
    }

    /// Failure feedback; invoked once per conclusive failure
    fn record_failure(&self);

    /// Success feedback for queue adapters that report it
    fn record_success(&self) {}
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    opened_at: Option<Instant>,
    metrics: CircuitBreakerMetrics,
}

/// Default breaker backed by consecutive-failure counting
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given name and configuration
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        info!(
            component = %name,
            failure_threshold = config.failure_threshold,
            timeout_seconds = config.timeout_seconds,
            success_threshold = config.success_threshold,
            "🛡️ Circuit breaker initialized"
        );

        Self {
            name,
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                opened_at: None,
                metrics: CircuitBreakerMetrics::new(),
            }),
        }
    }

    /// Get current metrics snapshot
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner);
        let mut snapshot = inner.metrics.clone();
        snapshot.current_state = inner.state;
        snapshot
    }

    /// Force circuit to open state (for emergency situations)
    pub fn force_open(&self) {
        warn!(component = %self.name, "🚨 Circuit breaker forced open");
        let mut inner = self.inner.lock();
        self.transition_to_open(&mut inner);
    }

    /// Force circuit to closed state (for emergency recovery)
    pub fn force_closed(&self) {
        warn!(component = %self.name, "🚨 Circuit breaker forced closed");
        let mut inner = self.inner.lock();
        self.transition_to_closed(&mut inner);
    }

    /// Move an expired open circuit to half-open
    fn refresh(&self, inner: &mut BreakerInner) {
        if inner.state != CircuitState::Open {
            return;
        }
        match inner.opened_at {
            Some(opened_at) if opened_at.elapsed() >= self.config.timeout() => {
                inner.state = CircuitState::HalfOpen;
                inner.metrics.half_open_successes = 0;
                info!(
                    component = %self.name,
                    success_threshold = self.config.success_threshold,
                    "🟡 Circuit breaker half-open (testing recovery)"
                );
            }
            Some(_) => {}
            None => {
                warn!(component = %self.name, "Circuit open but no timestamp recorded");
                inner.opened_at = Some(Instant::now());
            }
        }
    }

    fn transition_to_open(&self, inner: &mut BreakerInner) {
        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
        inner.metrics.half_open_successes = 0;
        inner.metrics.times_opened += 1;

        error!(
            component = %self.name,
            consecutive_failures = inner.metrics.consecutive_failures,
            failure_threshold = self.config.failure_threshold,
            timeout_seconds = self.config.timeout_seconds,
            "🔴 Circuit breaker opened (failing fast)"
        );
    }

    fn transition_to_closed(&self, inner: &mut BreakerInner) {
        inner.state = CircuitState::Closed;
        inner.opened_at = None;
        inner.metrics.consecutive_failures = 0;
        inner.metrics.half_open_successes = 0;

        info!(component = %self.name, "🟢 Circuit breaker closed (recovered)");
    }
}

impl BreakerGate for CircuitBreaker {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner);
        inner.state
    }

    fn record_failure(&self) {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner);
        inner.metrics.failure_count += 1;
        inner.metrics.consecutive_failures += 1;

        debug!(
            component = %self.name,
            consecutive_failures = inner.metrics.consecutive_failures,
            "🔴 Failure recorded"
        );

        match inner.state {
            CircuitState::Closed => {
                if inner.metrics.consecutive_failures >= u64::from(self.config.failure_threshold) {
                    self.transition_to_open(&mut inner);
                }
            }
            // Any failure while probing reopens the circuit
            CircuitState::HalfOpen => self.transition_to_open(&mut inner),
            CircuitState::Open => {}
        }
    }

    fn record_success(&self) {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner);
        inner.metrics.success_count += 1;

        match inner.state {
            CircuitState::Closed => inner.metrics.consecutive_failures = 0,
            CircuitState::HalfOpen => {
                inner.metrics.half_open_successes += 1;
                if inner.metrics.half_open_successes >= u64::from(self.config.success_threshold) {
                    self.transition_to_closed(&mut inner);
                }
            }
            CircuitState::Open => {
                warn!(component = %self.name, "Success recorded while circuit is open");
            }
        }
    }
}
