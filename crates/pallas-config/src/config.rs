//! The root configuration type.

use serde::{Deserialize, Serialize};

use crate::{
    BindingConfig, ConfigError, LogFormat, MvcOptionsConfig, TelemetryConfigSection,
    ValidationConfig,
};

/// Complete Pallas configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to layer files and environment
/// variables over the defaults.
///
/// # Example
///
/// ```
/// use pallas_config::PallasConfig;
///
/// let config = PallasConfig::default();
/// assert_eq!(config.mvc.max_model_validation_errors, 200);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct PallasConfig {
    /// Pipeline options.
    #[serde(default)]
    pub mvc: MvcOptionsConfig,

    /// Model binding options.
    #[serde(default)]
    pub binding: BindingConfig,

    /// Validation options.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Logging, metrics and diagnostics.
    #[serde(default)]
    pub telemetry: TelemetryConfigSection,
}

impl PallasConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> PallasConfigBuilder {
        PallasConfigBuilder::default()
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mvc.max_model_validation_errors == 0 {
            return Err(ConfigError::invalid_value(
                "mvc.max_model_validation_errors",
                "must be at least 1",
            ));
        }
        if self.binding.max_body_size == 0 {
            return Err(ConfigError::invalid_value(
                "binding.max_body_size",
                "must be at least 1 byte",
            ));
        }
        if self.validation.max_validation_depth == Some(0) {
            return Err(ConfigError::invalid_value(
                "validation.max_validation_depth",
                "must be at least 1, or unset for no limit",
            ));
        }
        if self.telemetry.service_name.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "telemetry.service_name",
                "must not be empty",
            ));
        }
        if self.telemetry.logging.enabled && self.telemetry.logging.level.trim().is_empty() {
            return Err(ConfigError::validation_error(
                "telemetry.logging.level must be set when logging is enabled",
            ));
        }
        Ok(())
    }

    /// Preset for local development: pretty `debug` logs with call sites,
    /// and stage-by-stage pipeline diagnostics.
    ///
    /// ```
    /// use pallas_config::PallasConfig;
    ///
    /// let config = PallasConfig::development();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.telemetry.environment = "development".to_string();
        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.ansi_enabled = true;
        config.telemetry.logging.include_location = true;
        config.telemetry.diagnostics.stage_events = true;
        config
    }

    /// Preset for production: JSON `info` logs, outcome-only diagnostics.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.telemetry.environment = "production".to_string();
        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.telemetry.logging.ansi_enabled = false;
        config.telemetry.diagnostics.stage_events = false;
        config
    }
}

/// Builder for [`PallasConfig`].
#[derive(Debug, Default)]
pub struct PallasConfigBuilder {
    mvc: Option<MvcOptionsConfig>,
    binding: Option<BindingConfig>,
    validation: Option<ValidationConfig>,
    telemetry: Option<TelemetryConfigSection>,
}

impl PallasConfigBuilder {
    /// Sets the pipeline options.
    #[must_use]
    pub fn mvc(mut self, mvc: MvcOptionsConfig) -> Self {
        self.mvc = Some(mvc);
        self
    }

    /// Sets the binding options.
    #[must_use]
    pub fn binding(mut self, binding: BindingConfig) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Sets the validation options.
    #[must_use]
    pub fn validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = Some(validation);
        self
    }

    /// Sets the telemetry section.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetryConfigSection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Builds the configuration; unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> PallasConfig {
        PallasConfig {
            mvc: self.mvc.unwrap_or_default(),
            binding: self.binding.unwrap_or_default(),
            validation: self.validation.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
        }
    }

    /// Builds and validates the configuration.
    pub fn build_validated(self) -> Result<PallasConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
