//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files.

use std::io::Write;
use std::path::PathBuf;

use njuns_domain::{Environment, EnvironmentKind, NjunsError};
use njuns_infra::config;
use tempfile::NamedTempFile;

/// Write `contents` to a temp file carrying `extension`.
fn config_file(contents: &str, extension: &str) -> PathBuf {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(contents.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension(extension);
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");
    path
}

#[test]
fn test_load_config_from_json_file() {
    let path = config_file(
        r#"{
            "environment": "uat",
            "user_agent": "ops-bot/1.0",
            "client_id": "njuns-client",
            "client_secret": "s3cret",
            "timeout_secs": 15,
            "retry": {
                "max_attempts": 3,
                "unit_millis": 500,
                "rate_limit_delay_units": 4
            }
        }"#,
        "json",
    );

    let config = config::load_from_file(Some(path.clone())).expect("JSON config should load");

    assert_eq!(config.environment, EnvironmentKind::Uat);
    assert_eq!(config.environment().unwrap(), Environment::Uat);
    assert_eq!(config.user_agent(), "ops-bot/1.0");
    assert_eq!(config.client_id, "njuns-client");
    assert_eq!(config.client_secret, "s3cret");
    assert_eq!(config.timeout_secs, 15);
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.retry.unit_millis, 500);
    assert_eq!(config.retry.rate_limit_delay_units, 4);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_from_toml_file() {
    let path = config_file(
        r#"
environment = "custom"
base_url = "http://localhost:8080/app/rest/v2/"
timeout_secs = 5

[retry]
max_attempts = 2
unit_millis = 10
"#,
        "toml",
    );

    let config = config::load_from_file(Some(path.clone())).expect("TOML config should load");

    assert_eq!(
        config.environment().unwrap(),
        Environment::Custom("http://localhost:8080/app/rest/v2/".to_string())
    );
    assert_eq!(config.environment().unwrap().base_url(), "http://localhost:8080/app/rest/v2");
    assert_eq!(config.timeout_secs, 5);
    assert_eq!(config.retry.max_attempts, 2);
    assert_eq!(config.retry.unit_millis, 10);
    assert_eq!(config.retry.rate_limit_delay_units, 3);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_with_minimal_fields() {
    let path = config_file("{}", "json");

    let config = config::load_from_file(Some(path.clone())).expect("empty config should load");

    assert_eq!(config.environment().unwrap(), Environment::Production);
    assert_eq!(config.client_id, "client");
    assert_eq!(config.client_secret, "secret");
    assert_eq!(config.timeout_secs, 30);
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.retry.unit_millis, 1_000);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_rejects_invalid_values() {
    let path = config_file("[retry]\nmax_attempts = 0\n", "toml");

    let err = config::load_from_file(Some(path.clone())).unwrap_err();
    assert!(matches!(err, NjunsError::Config(ref msg) if msg.contains("max_attempts")));

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_from_nonexistent_file() {
    let result = config::load_from_file(Some(PathBuf::from("/nonexistent/path/njuns.json")));

    assert!(result.is_err(), "Should fail for nonexistent file");
    assert!(matches!(result.unwrap_err(), NjunsError::Config(_)));
}

#[test]
fn test_load_config_with_invalid_format() {
    let path = config_file("{ not valid json", "json");

    let err = config::load_from_file(Some(path.clone())).unwrap_err();
    assert!(err.to_string().contains("Invalid JSON format"));

    std::fs::remove_file(path).ok();
}
