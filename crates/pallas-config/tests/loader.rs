//! File, `.env` and environment layering against the real filesystem.

use pallas_config::{ConfigError, ConfigLoader, LogFormat, PallasConfig};
use std::io::Write;
use tempfile::NamedTempFile;

fn file_with(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_toml_file_over_production_preset() {
    let file = file_with(
        ".toml",
        r#"
            [mvc]
            suppress_model_state_invalid_filter = true

            [telemetry]
            service_name = "orders"
        "#,
    );

    let config = ConfigLoader::new()
        .with_production()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap();

    assert!(config.mvc.suppress_model_state_invalid_filter);
    assert_eq!(config.telemetry.service_name, "orders");
    assert_eq!(config.telemetry.environment, "production");
    assert_eq!(config.telemetry.logging.format, LogFormat::Json);
}

#[test]
fn test_json_file() {
    let file = file_with(".json", r#"{"binding": {"max_body_size": 4096}}"#);
    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    assert_eq!(config.binding.max_body_size, 4096);
}

#[test]
fn test_unknown_extension() {
    let file = file_with(".ini", "[mvc]");
    let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("unsupported configuration format: ini"));
}

#[test]
fn test_invalid_value_in_file_fails_load() {
    let file = file_with(".toml", "[binding]\nmax_body_size = 0\n");
    let err = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "binding.max_body_size"));
}

#[test]
fn test_env_overrides_win_over_file() {
    let file = file_with(".toml", "[mvc]\nmax_model_validation_errors = 10\n");
    std::env::set_var("PALLAS_IT_ENV__MVC__MAX_MODEL_VALIDATION_ERRORS", "3");
    std::env::set_var("PALLAS_IT_ENV__TELEMETRY__DIAGNOSTICS__STAGE_EVENTS", "on");

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .with_env_prefix("pallas_it_env")
        .load()
        .unwrap();

    assert_eq!(config.mvc.max_model_validation_errors, 3);
    assert!(config.telemetry.diagnostics.stage_events);
}

#[test]
fn test_dotenv_file_feeds_overrides() {
    let dotenv = file_with(
        ".env",
        "PALLAS_IT_DOTENV__TELEMETRY__LOGGING__LEVEL=warn\nPALLAS_IT_DOTENV__BINDING__ALLOW_EMPTY_BODY=true\n",
    );

    let config = ConfigLoader::new()
        .with_dotenv_file(dotenv.path())
        .unwrap()
        .with_env_prefix("PALLAS_IT_DOTENV")
        .load()
        .unwrap();

    assert_eq!(config.telemetry.logging.level, "warn");
    assert!(config.binding.allow_empty_body);
}

#[test]
fn test_unknown_env_field_fails_load() {
    std::env::set_var("PALLAS_IT_UNKNOWN__MVC__PORT", "80");
    let err = ConfigLoader::new()
        .with_env_prefix("PALLAS_IT_UNKNOWN")
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnknownField { .. }));
}

#[test]
fn test_no_layers_is_default() {
    assert_eq!(ConfigLoader::default().load().unwrap(), PallasConfig::default());
}
