//! Configuration sections.

use serde::{Deserialize, Serialize};

/// Options of the MVC pipeline itself.
///
/// # Example
///
/// ```
/// use pallas_config::MvcOptionsConfig;
///
/// let mvc = MvcOptionsConfig::default();
/// assert_eq!(mvc.max_model_validation_errors, 200);
/// assert!(!mvc.suppress_model_state_invalid_filter);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MvcOptionsConfig {
    /// Errors recorded in model state before binding stops adding more.
    #[serde(default = "default_max_model_validation_errors")]
    pub max_model_validation_errors: usize,

    /// Do not register the filter answering 415 for unsupported bodies.
    #[serde(default)]
    pub suppress_unsupported_media_type_filter: bool,

    /// Do not register the filter answering 400 for invalid model state.
    #[serde(default)]
    pub suppress_model_state_invalid_filter: bool,
}

impl Default for MvcOptionsConfig {
    fn default() -> Self {
        Self {
            max_model_validation_errors: default_max_model_validation_errors(),
            suppress_unsupported_media_type_filter: false,
            suppress_model_state_invalid_filter: false,
        }
    }
}

fn default_max_model_validation_errors() -> usize {
    200
}

/// Model binding options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BindingConfig {
    /// Bind an empty body as the type default instead of failing.
    #[serde(default)]
    pub allow_empty_body: bool,

    /// Largest body the JSON formatter reads, in bytes.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            allow_empty_body: false,
            max_body_size: default_max_body_size(),
        }
    }
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

/// Validation options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// How deep the validation walk may descend; `None` is unlimited.
    #[serde(default = "default_max_validation_depth")]
    pub max_validation_depth: Option<usize>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_validation_depth: default_max_validation_depth(),
        }
    }
}

#[allow(clippy::unnecessary_wraps)]
fn default_max_validation_depth() -> Option<usize> {
    Some(32)
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines.
    #[default]
    Json,
    /// Human-readable output.
    Pretty,
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Install a subscriber.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directives (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Color the output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include file and line.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Record pipeline metrics.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Diagnostic listener section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DiagnosticsConfig {
    /// Log pipeline outcomes.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Also log every stage boundary.
    #[serde(default)]
    pub stage_events: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stage_events: false,
        }
    }
}

/// Telemetry section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfigSection {
    /// Service name.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Deployment environment.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Diagnostic listeners.
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

impl Default for TelemetryConfigSection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            environment: default_environment(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

fn default_service_name() -> String {
    "pallas-app".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_fill_missing_fields() {
        let binding: BindingConfig = toml::from_str("allow_empty_body = true").unwrap();
        assert!(binding.allow_empty_body);
        assert_eq!(binding.max_body_size, 1024 * 1024);

        let validation: ValidationConfig = toml::from_str("").unwrap();
        assert_eq!(validation.max_validation_depth, Some(32));
    }

    #[test]
    fn test_log_format_lowercase() {
        let logging: LoggingConfig = toml::from_str(r#"format = "pretty""#).unwrap();
        assert_eq!(logging.format, LogFormat::Pretty);
        assert!(toml::from_str::<LoggingConfig>(r#"format = "Pretty""#).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<MvcOptionsConfig, _> = toml::from_str("max_errors = 3");
        assert!(result.is_err());
    }
}
