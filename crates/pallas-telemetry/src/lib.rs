//! # Pallas Telemetry
//!
//! Observability for applications built on Pallas.
//!
//! - [`init_logging`] - Installs the `tracing-subscriber` (JSON or pretty, `EnvFilter`)
//! - [`TracingDiagnosticListener`] - Pipeline diagnostics as structured log events
//! - [`MetricsDiagnosticListener`] - Pipeline diagnostics as `metrics` counters and histograms
//! - [`TelemetryConfig`] - Which of the above to set up
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `pallas_actions_total` | Counter | `action`, `status` |
//! | `pallas_action_duration_seconds` | Histogram | `action` |
//! | `pallas_filter_short_circuits_total` | Counter | `action`, `stage`, `filter` |
//! | `pallas_unhandled_exceptions_total` | Counter | `action` |
//!
//! # Example
//!
//! ```rust,ignore
//! use pallas_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::builder().service_name("orders").build();
//! let diagnostics = init_telemetry(&config)?;
//! // hand `diagnostics` to the pipeline builder
//! ```

#![doc(html_root_url = "https://docs.rs/pallas-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod listener;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use listener::TracingDiagnosticListener;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use self::metrics::{describe_metrics, MetricsDiagnosticListener};

use pallas_pipeline::Diagnostics;

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Sets up logging and metric descriptions, and returns the listeners to
/// register with the pipeline.
///
/// Installs a global subscriber, so call it once per process.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<Diagnostics> {
    config.logging.validate()?;
    init_logging(&config.logging)?;
    if config.metrics_enabled {
        describe_metrics();
    }
    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        "telemetry initialized"
    );
    Ok(config.diagnostics())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_rejects_invalid_level_before_installing() {
        let config = TelemetryConfig::builder()
            .logging(LogConfig {
                level: "pallas=loud".to_string(),
                ..LogConfig::default()
            })
            .build();
        assert!(matches!(
            init_telemetry(&config),
            Err(TelemetryError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_init_with_logging_disabled() {
        let config = TelemetryConfig::builder()
            .logging(LogConfig {
                enabled: false,
                ..LogConfig::default()
            })
            .build();
        let diagnostics = init_telemetry(&config).unwrap();
        assert_eq!(diagnostics.len(), 2);
    }
}
