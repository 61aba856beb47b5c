//! Telemetry configuration.

use crate::listener::TracingDiagnosticListener;
use crate::logging::LogConfig;
use crate::metrics::MetricsDiagnosticListener;
use pallas_pipeline::Diagnostics;
use std::sync::Arc;

/// Configuration for logging and the pipeline listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name, attached to the root span of the process.
    pub service_name: String,

    /// Deployment environment.
    pub environment: String,

    /// Logging setup.
    pub logging: LogConfig,

    /// Register the [`MetricsDiagnosticListener`].
    pub metrics_enabled: bool,

    /// Register the [`TracingDiagnosticListener`].
    pub diagnostics_enabled: bool,

    /// Let the tracing listener log stage boundaries, not only outcomes.
    pub stage_events: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "pallas-app".to_string(),
            environment: "development".to_string(),
            logging: LogConfig::default(),
            metrics_enabled: true,
            diagnostics_enabled: true,
            stage_events: false,
        }
    }
}

impl TelemetryConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder::default()
    }

    /// The diagnostic listeners this configuration asks for.
    #[must_use]
    pub fn diagnostics(&self) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        if self.diagnostics_enabled {
            let listener = if self.stage_events {
                TracingDiagnosticListener::new()
            } else {
                TracingDiagnosticListener::new().outcomes_only()
            };
            diagnostics.add(Arc::new(listener));
        }
        if self.metrics_enabled {
            diagnostics.add(Arc::new(MetricsDiagnosticListener::new()));
        }
        diagnostics
    }
}

/// Builder for [`TelemetryConfig`].
#[derive(Debug, Default)]
pub struct TelemetryConfigBuilder {
    config: Option<TelemetryConfig>,
}

impl TelemetryConfigBuilder {
    fn config(&mut self) -> &mut TelemetryConfig {
        self.config.get_or_insert_with(TelemetryConfig::default)
    }

    /// Sets the service name.
    #[must_use]
    pub fn service_name(mut self, name: &str) -> Self {
        self.config().service_name = name.to_string();
        self
    }

    /// Sets the environment.
    #[must_use]
    pub fn environment(mut self, environment: &str) -> Self {
        self.config().environment = environment.to_string();
        self
    }

    /// Sets the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LogConfig) -> Self {
        self.config().logging = logging;
        self
    }

    /// Enables or disables the metrics listener.
    #[must_use]
    pub fn metrics(mut self, enabled: bool) -> Self {
        self.config().metrics_enabled = enabled;
        self
    }

    /// Enables or disables the tracing listener.
    #[must_use]
    pub fn diagnostics(mut self, enabled: bool) -> Self {
        self.config().diagnostics_enabled = enabled;
        self
    }

    /// Logs stage boundaries as well as outcomes.
    #[must_use]
    pub fn stage_events(mut self, enabled: bool) -> Self {
        self.config().stage_events = enabled;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> TelemetryConfig {
        self.config.unwrap_or_default()
    }
}
