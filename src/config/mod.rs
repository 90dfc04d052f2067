//! # Step Worker Configuration
//!
//! Layered configuration for the saga step worker: built-in defaults, then an
//! optional file, then `SAGA_STEP_*` environment variables. Configuration is
//! validated once after loading; nothing downstream re-checks it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use saga_order_step::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let queue = &manager.config().server_queue;
//! let address = &manager.config().order_service.address;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::client::OrderServiceConfig;
use crate::constants::OrderStatus;
use crate::resilience::CircuitBreakerConfig;
use serde::{Deserialize, Serialize};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration for one step worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepWorkerConfig {
    /// Queue (partition) this worker consumes; also names its spans
    pub server_queue: String,

    /// Queue the next saga step consumes
    pub next_queue: String,

    pub order_service: OrderServiceConfig,

    pub circuit_breaker: CircuitBreakerConfig,

    pub fault_injection: FaultInjectionConfig,

    pub telemetry: TelemetryConfig,
}

impl Default for StepWorkerConfig {
    fn default() -> Self {
        Self {
            server_queue: "order".to_string(),
            next_queue: "payment".to_string(),
            order_service: OrderServiceConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            fault_injection: FaultInjectionConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl StepWorkerConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server_queue.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "server_queue",
                "step worker",
            ));
        }
        if self.order_service.address.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "address",
                "order_service",
            ));
        }
        if self.order_service.request_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "order_service.request_timeout_ms",
                "0",
                "request timeout must be positive",
            ));
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(ConfigurationError::invalid_value(
                "circuit_breaker.failure_threshold",
                "0",
                "must be at least 1",
            ));
        }
        if self.circuit_breaker.success_threshold == 0 {
            return Err(ConfigurationError::invalid_value(
                "circuit_breaker.success_threshold",
                "0",
                "must be at least 1",
            ));
        }
        self.fault_injection.validate()
    }
}

/// Deterministic failure injection, honored only in test mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultInjectionConfig {
    /// Must be set for any fault injection to take effect
    pub test_mode: bool,

    /// Queues whose performs are forced to fail after the order exists
    pub force_fail_queues: Vec<String>,

    /// Status the forced order is marked with
    pub status: OrderStatus,
}

impl Default for FaultInjectionConfig {
    fn default() -> Self {
        Self {
            test_mode: false,
            force_fail_queues: Vec::new(),
            status: OrderStatus::ForcedFail,
        }
    }
}

impl FaultInjectionConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.test_mode && !self.force_fail_queues.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "fault_injection.force_fail_queues",
                self.force_fail_queues.join(","),
                "fault injection requires fault_injection.test_mode",
            ));
        }
        if self.status == OrderStatus::Fail {
            return Err(ConfigurationError::invalid_value(
                "fault_injection.status",
                self.status.as_str(),
                "forced failures use DEFAULT_RESPONSE or FORCED_FAIL",
            ));
        }
        Ok(())
    }

    /// Whether performs on `queue` should be forced to fail
    pub fn targets(&self, queue: &str) -> bool {
        self.test_mode && self.force_fail_queues.iter().any(|q| q == queue)
    }
}

/// Console log rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Logging and trace export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_format: LogFormat,

    /// Filter directive; overrides the environment default when set
    pub log_level: Option<String>,

    /// OTLP collector endpoint; span export is disabled when unset
    pub otlp_endpoint: Option<String>,

    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            log_level: None,
            otlp_endpoint: None,
            service_name: "saga-order-step".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(StepWorkerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_queue_rejected() {
        let config = StepWorkerConfig {
            server_queue: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::MissingRequiredField { .. })
        ));
    }

    #[test]
    fn test_fault_injection_requires_test_mode() {
        let mut config = StepWorkerConfig::default();
        config.fault_injection.force_fail_queues = vec!["order".to_string()];
        assert!(config.validate().is_err());
        assert!(!config.fault_injection.targets("order"));

        config.fault_injection.test_mode = true;
        assert!(config.validate().is_ok());
        assert!(config.fault_injection.targets("order"));
        assert!(!config.fault_injection.targets("payment"));
    }

    #[test]
    fn test_fault_injection_status_cannot_be_fail() {
        let mut config = StepWorkerConfig::default();
        config.fault_injection.status = OrderStatus::Fail;
        assert!(config.validate().is_err());
    }
}
