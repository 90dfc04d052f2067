//! Configuration Loader
//!
//! Environment-aware loading built on the `config` crate. Sources are merged in
//! order, later sources overriding earlier ones:
//!
//! 1. built-in defaults
//! 2. `{dir}/saga-step.{toml,yaml,json}` (optional)
//! 3. `{dir}/saga-step.{environment}.{toml,yaml,json}` (optional)
//! 4. `SAGA_STEP_*` environment variables, `__` separating nested keys
//!    (e.g. `SAGA_STEP_ORDER_SERVICE__ADDRESS=orders:8080`)

use super::error::{ConfigResult, ConfigurationError};
use super::StepWorkerConfig;
use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const ENV_PREFIX: &str = "SAGA_STEP";
const CONFIG_BASENAME: &str = "saga-step";

/// Loaded, validated configuration plus the environment it was loaded for
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: StepWorkerConfig,
    environment: String,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_dir = config_dir.unwrap_or_else(|| PathBuf::from("config"));
        let base = config_dir.join(CONFIG_BASENAME);
        let env_specific = config_dir.join(format!("{CONFIG_BASENAME}.{environment}"));

        let files = vec![
            File::with_name(&base.to_string_lossy()).required(false),
            File::with_name(&env_specific.to_string_lossy()).required(false),
        ];
        Self::load_layers(files, environment, None)
    }

    /// Load configuration from one explicit file, which must exist
    pub fn load_from_file(path: &Path) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        let files = vec![File::from(path).required(true)];
        Self::load_layers(files, &environment, None)
    }

    fn load_layers(
        files: Vec<File<config::FileSourceFile, config::FileFormat>>,
        environment: &str,
        env_source: Option<config::Map<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let load_failed = |e: config::ConfigError| ConfigurationError::LoadFailed {
            environment: environment.to_string(),
            error: e.to_string(),
        };

        let defaults = Config::try_from(&StepWorkerConfig::default()).map_err(load_failed)?;

        let mut builder = Config::builder().add_source(defaults);
        for file in files {
            builder = builder.add_source(file);
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("fault_injection.force_fail_queues")
                .source(env_source),
        );

        let config: StepWorkerConfig = builder
            .build()
            .map_err(load_failed)?
            .try_deserialize()
            .map_err(|e| ConfigurationError::Deserialize {
                error: e.to_string(),
            })?;

        config.validate()?;

        debug!(
            config = %serde_json::to_string(&config).unwrap_or_else(|_| "[serialization error]".to_string()),
            "Configuration resolved"
        );
        info!(
            environment = %environment,
            server_queue = %config.server_queue,
            order_service = %config.order_service.address,
            fault_injection = config.fault_injection.test_mode,
            "🔧 Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &StepWorkerConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Current environment from environment variables
    pub fn detect_environment() -> String {
        env::var("SAGA_STEP_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use crate::constants::OrderStatus;
    use std::fs;

    #[test]
    fn test_directory_without_files_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
                .unwrap();
        assert_eq!(manager.environment(), "test");
        assert_eq!(manager.config().server_queue, "order");
    }

    #[test]
    fn test_environment_file_overrides_base_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("saga-step.toml"),
            r#"
server_queue = "inventory"

[order_service]
address = "orders:9000"
"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("saga-step.test.toml"),
            r#"
[order_service]
address = "orders-test:9000"

[telemetry]
log_format = "json"
"#,
        )
        .unwrap();

        let manager =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
                .unwrap();
        let config = manager.config();
        assert_eq!(config.server_queue, "inventory");
        assert_eq!(config.order_service.address, "orders-test:9000");
        assert_eq!(config.order_service.request_timeout_ms, 10_000);
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
    }

    #[test]
    fn test_environment_variables_override_files() {
        let mut vars = config::Map::new();
        vars.insert("SAGA_STEP_SERVER_QUEUE".to_string(), "order-2".to_string());
        vars.insert(
            "SAGA_STEP_FAULT_INJECTION__TEST_MODE".to_string(),
            "true".to_string(),
        );
        vars.insert(
            "SAGA_STEP_FAULT_INJECTION__FORCE_FAIL_QUEUES".to_string(),
            "order-2,order-3".to_string(),
        );
        vars.insert(
            "SAGA_STEP_FAULT_INJECTION__STATUS".to_string(),
            "DEFAULT_RESPONSE".to_string(),
        );

        let manager = ConfigManager::load_layers(Vec::new(), "test", Some(vars)).unwrap();
        let config = manager.config();
        assert_eq!(config.server_queue, "order-2");
        assert!(config.fault_injection.targets("order-2"));
        assert!(config.fault_injection.targets("order-3"));
        assert_eq!(config.fault_injection.status, OrderStatus::DefaultResponse);
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(
            &path,
            r#"
[fault_injection]
force_fail_queues = ["order"]
"#,
        )
        .unwrap();

        let result = ConfigManager::load_from_file(&path);
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigManager::load_from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigurationError::LoadFailed { .. })));
    }
}
