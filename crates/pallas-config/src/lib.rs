//! # Pallas Config
//!
//! Typed configuration for Pallas applications.
//!
//! - [`PallasConfig`] - Root type with the `mvc`, `binding`, `validation` and `telemetry` sections
//! - [`ConfigLoader`] - Defaults, then files, then `PALLAS__SECTION__KEY` environment overrides
//! - Strict parsing: unknown fields are errors
//!
//! # Configuration File Format
//!
//! ```toml
//! [mvc]
//! max_model_validation_errors = 200
//! suppress_unsupported_media_type_filter = false
//! suppress_model_state_invalid_filter = false
//!
//! [binding]
//! allow_empty_body = false
//! max_body_size = 1048576
//!
//! [validation]
//! max_validation_depth = 32
//!
//! [telemetry]
//! service_name = "orders"
//! environment = "production"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//!
//! [telemetry.metrics]
//! enabled = true
//!
//! [telemetry.diagnostics]
//! stage_events = false
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `PALLAS__MVC__MAX_MODEL_VALIDATION_ERRORS=50`
//! - `PALLAS__BINDING__ALLOW_EMPTY_BODY=true`
//! - `PALLAS__VALIDATION__MAX_VALIDATION_DEPTH=none`
//! - `PALLAS__TELEMETRY__LOGGING__LEVEL=pallas_pipeline=debug,info`

#![doc(html_root_url = "https://docs.rs/pallas-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{PallasConfig, PallasConfigBuilder};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::*;
