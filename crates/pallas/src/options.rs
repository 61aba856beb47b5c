//! Maps the loaded configuration onto the options of the individual crates.

use pallas_binding::{JsonInputFormatter, ModelBinderFactory, PlainTextInputFormatter};
use pallas_config::{BindingConfig, LoggingConfig, PallasConfig, TelemetryConfigSection};
use pallas_telemetry::{LogConfig, LogFormat, TelemetryConfig};

/// Telemetry options for the `[telemetry]` section.
///
/// # Example
///
/// ```
/// use pallas::telemetry_config;
/// use pallas_config::PallasConfig;
///
/// let telemetry = telemetry_config(&PallasConfig::development().telemetry);
/// assert!(telemetry.stage_events);
/// assert_eq!(telemetry.logging.level, "debug");
/// ```
#[must_use]
pub fn telemetry_config(section: &TelemetryConfigSection) -> TelemetryConfig {
    TelemetryConfig::builder()
        .service_name(&section.service_name)
        .environment(&section.environment)
        .logging(log_config(&section.logging))
        .metrics(section.metrics.enabled)
        .diagnostics(section.diagnostics.enabled)
        .stage_events(section.diagnostics.stage_events)
        .build()
}

fn log_config(logging: &LoggingConfig) -> LogConfig {
    let base = match logging.format {
        pallas_config::LogFormat::Json => LogConfig::production(),
        pallas_config::LogFormat::Pretty => LogConfig {
            span_events: false,
            ..LogConfig::development()
        },
    };
    LogConfig {
        enabled: logging.enabled,
        level: logging.level.clone(),
        format: match logging.format {
            pallas_config::LogFormat::Json => LogFormat::Json,
            pallas_config::LogFormat::Pretty => LogFormat::Pretty,
        },
        file_line_info: logging.include_location,
        ansi: logging.ansi_enabled,
        ..base
    }
}

/// The binder factory for the `[binding]` section: JSON (size-limited) and
/// plain-text formatters.
#[must_use]
pub fn binder_factory(binding: &BindingConfig) -> ModelBinderFactory {
    ModelBinderFactory::builder()
        .formatter(JsonInputFormatter::new().max_body_size(binding.max_body_size))
        .formatter(PlainTextInputFormatter)
        .allow_empty_body(binding.allow_empty_body)
        .build()
}

pub(crate) fn max_validation_depth(config: &PallasConfig) -> Option<usize> {
    config.validation.max_validation_depth
}
