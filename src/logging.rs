//! # Structured Logging Module
//!
//! Environment-aware structured logging for the step worker, with optional
//! OpenTelemetry span export so every `{queue}.{action}` span reaches the
//! tracing backend.

use crate::config::{LogFormat, TelemetryConfig};
use chrono::Utc;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::{runtime, Resource};
use std::process;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();
static TRACER_PROVIDER: OnceLock<TracerProvider> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
///
/// Safe to call more than once; only the first call installs a subscriber, and
/// an already-installed global subscriber is left untouched.
pub fn init_structured_logging(environment: &str, telemetry: &TelemetryConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let log_level = telemetry
            .log_level
            .clone()
            .unwrap_or_else(|| get_log_level(environment).to_string());
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

        let console = match telemetry.log_format {
            LogFormat::Pretty => fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .boxed(),
            LogFormat::Json => fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .boxed(),
        };

        let otel_layer = telemetry.otlp_endpoint.as_deref().and_then(|endpoint| {
            match build_tracer_provider(endpoint, &telemetry.service_name) {
                Ok(provider) => {
                    let tracer = provider.tracer(telemetry.service_name.clone());
                    let _ = TRACER_PROVIDER.set(provider);
                    Some(tracing_opentelemetry::layer().with_tracer(tracer))
                }
                Err(e) => {
                    eprintln!("OTLP exporter setup failed, spans will not be exported: {e}");
                    None
                }
            }
        });

        let subscriber = tracing_subscriber::registry()
            .with(console.with_filter(filter))
            .with(otel_layer);

        if subscriber.try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        }

        tracing::info!(
            pid = process::id(),
            environment = %environment,
            log_level = %log_level,
            otlp_export = telemetry.otlp_endpoint.is_some(),
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

fn build_tracer_provider(
    endpoint: &str,
    service_name: &str,
) -> Result<TracerProvider, opentelemetry::trace::TraceError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.to_string(),
        )]))
        .build())
}

/// Flush and stop span export; call once on worker shutdown
pub fn shutdown_telemetry() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "Tracer provider shutdown failed");
        }
    }
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "test" => "debug",
        "development" => "debug",
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for step operations
pub fn log_step_operation(
    operation: &str,
    queue: &str,
    task_id: Uuid,
    order_id: Option<u64>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        queue = %queue,
        task_id = %task_id,
        order_id = order_id,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "🔧 STEP_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(get_log_level("test"), "debug");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("unknown"), "debug");
    }

    #[test]
    fn test_repeated_initialization_is_harmless() {
        let telemetry = TelemetryConfig::default();
        init_structured_logging("test", &telemetry);
        init_structured_logging("test", &telemetry);
        shutdown_telemetry();
    }
}
