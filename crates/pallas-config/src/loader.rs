//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::{ConfigError, PallasConfig};

/// Default prefix of environment overrides.
pub const DEFAULT_ENV_PREFIX: &str = "PALLAS";

/// Loads configuration in layers, later layers overriding earlier ones:
///
/// 1. defaults or a preset,
/// 2. configuration files (TOML or JSON, by extension) and strings,
/// 3. environment variables `PREFIX__SECTION__KEY`.
///
/// A layer only overrides the fields it names, so a file setting
/// `[mvc] max_model_validation_errors` keeps the rest of a preset.
///
/// # Example
///
/// ```no_run
/// use pallas_config::ConfigLoader;
///
/// # fn main() -> Result<(), pallas_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_production()
///     .with_optional_file("pallas.toml")?
///     .with_env_prefix("PALLAS")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: PallasConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Starts from the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: PallasConfig::default(),
            env_prefix: None,
        }
    }

    /// Resets to the default configuration.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = PallasConfig::default();
        self
    }

    /// Resets to the development preset.
    ///
    /// ```
    /// use pallas_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = PallasConfig::development();
        self
    }

    /// Resets to the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = PallasConfig::production();
        self
    }

    /// Layers a configuration file over the current values.
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| {
                ConfigError::validation_error(format!(
                    "unsupported configuration file format: {}",
                    path.display()
                ))
            })?;
        let loader = self.with_string(&content, &format)?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(loader)
    }

    /// Layers a configuration file if it exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Layers configuration text in `format` (`toml` or `json`).
    ///
    /// ```
    /// use pallas_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[binding]\nallow_empty_body = true", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    /// assert!(config.binding.allow_empty_body);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer: Value = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        let mut merged = serde_json::to_value(&self.config)?;
        merge(&mut merged, layer);
        self.config = serde_json::from_value(merged)?;
        Ok(self)
    }

    /// Reads overrides from `PREFIX__SECTION__KEY` variables at load time.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads `.env` from the working directory or its parents, if present.
    /// Variables already set in the environment win.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Loads variables from a specific `.env` file.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref())?;
        Ok(self)
    }

    /// Applies environment overrides and validates.
    pub fn load(mut self) -> Result<PallasConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }
        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> PallasConfig {
        self.config
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        let mut vars: Vec<(String, String)> = env::vars()
            .filter(|(key, _)| key.starts_with(&marker))
            .collect();
        vars.sort();
        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let path = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?
            .split("__")
            .map(str::to_lowercase)
            .collect::<Vec<_>>();

        let mut tree = serde_json::to_value(&self.config)?;
        let (field, sections) = path
            .split_last()
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let mut table = &mut tree;
        for section in sections {
            table = table
                .get_mut(section.as_str())
                .filter(|value| value.is_object())
                .ok_or_else(|| ConfigError::unknown_field(section.as_str(), sections.join(".")))?;
        }
        let slot = table
            .get_mut(field.as_str())
            .ok_or_else(|| ConfigError::unknown_field(field.as_str(), sections.join(".")))?;
        *slot = parse_override(key, value, slot)?;

        self.config = serde_json::from_value(tree)
            .map_err(|e| ConfigError::env_parse_error(key, e.to_string()))?;
        tracing::debug!(var = key, "applied environment override");
        Ok(())
    }
}

/// Parses an override according to the type of the value it replaces.
fn parse_override(key: &str, raw: &str, current: &Value) -> Result<Value, ConfigError> {
    match current {
        Value::Null | Value::Number(_) if raw.is_empty() || raw.eq_ignore_ascii_case("none") => {
            Ok(Value::Null)
        }
        Value::Bool(_) => parse_bool(raw)
            .map(Value::Bool)
            .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean")),
        Value::Number(_) => raw
            .parse::<u64>()
            .map(Value::from)
            .map_err(|_| ConfigError::env_parse_error(key, "expected integer")),
        Value::Null => Ok(raw
            .parse::<u64>()
            .map_or_else(|_| Value::String(raw.to_string()), Value::from)),
        Value::Object(_) | Value::Array(_) => Err(ConfigError::env_parse_error(
            key,
            "names a section, not a value",
        )),
        Value::String(_) => Ok(Value::String(raw.to_string())),
    }
}

/// Deep-merges `layer` into `base`; tables merge, everything else replaces.
fn merge(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => merge_tables(base, layer),
        (base, layer) => *base = layer,
    }
}

fn merge_tables(base: &mut Map<String, Value>, layer: Map<String, Value>) {
    for (key, value) in layer {
        match base.get_mut(&key) {
            Some(existing) => merge(existing, value),
            None => {
                base.insert(key, value);
            }
        }
    }
}

/// Parses a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
