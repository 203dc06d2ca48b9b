//! Configuration loader
//!
//! Loads [`ClientConfig`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `NJUNS_ENVIRONMENT` and `NJUNS_BASE_URL` are both unset, falls back
//!    to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `NJUNS_ENVIRONMENT`: `production`, `uat` or `custom`
//! - `NJUNS_BASE_URL`: REST base URL; implies `custom` when no environment is set
//! - `NJUNS_USER_AGENT`: Client identifier sent with every request
//! - `NJUNS_CLIENT_ID`: OAuth client id (default `client`)
//! - `NJUNS_CLIENT_SECRET`: OAuth client secret (default `secret`)
//! - `NJUNS_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `NJUNS_RETRY_MAX_ATTEMPTS`: Attempts per request, including the first
//! - `NJUNS_RETRY_UNIT_MS`: Backoff unit in milliseconds
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./njuns.{toml,json}`, then `./config.{toml,json}` (current working directory)
//! 2. The same names in the parent directory
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use njuns_domain::{ClientConfig, EnvironmentKind, NjunsError, Result};

const CONFIG_FILE_NAMES: [&str; 4] = ["njuns.toml", "njuns.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If no environment is
/// selected there, falls back to loading from a config file.
///
/// # Errors
/// Returns `NjunsError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A value fails validation
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Like [`load`], but an absent configuration means production defaults.
///
/// Invalid values are still reported.
///
/// # Errors
/// Returns `NjunsError::Config` if a configuration was found but is invalid.
pub fn load_or_default() -> Result<ClientConfig> {
    if has_env_selector(&|key| std::env::var(key).ok()) {
        return load_from_env();
    }
    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::debug!("No configuration found, using production defaults");
            Ok(ClientConfig::default())
        }
    }
}

/// Load configuration from the process environment
///
/// # Errors
/// Returns `NjunsError::Config` if no environment is selected or a variable
/// has an invalid value.
pub fn load_from_env() -> Result<ClientConfig> {
    load_from_env_with(|key| std::env::var(key).ok())
}

/// Load configuration through an arbitrary variable lookup.
///
/// Unset variables keep their defaults; at least one of `NJUNS_ENVIRONMENT`
/// or `NJUNS_BASE_URL` must be present.
///
/// # Errors
/// Returns `NjunsError::Config` if no environment is selected or a variable
/// has an invalid value.
pub fn load_from_env_with<F>(lookup: F) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if !has_env_selector(&lookup) {
        return Err(NjunsError::Config(
            "Missing required environment variable: NJUNS_ENVIRONMENT or NJUNS_BASE_URL"
                .to_string(),
        ));
    }

    let environment = match lookup("NJUNS_ENVIRONMENT") {
        Some(value) => EnvironmentKind::from_str(&value)?,
        None => EnvironmentKind::Custom,
    };
    let mut config = ClientConfig {
        environment,
        base_url: lookup("NJUNS_BASE_URL").filter(|url| !url.trim().is_empty()),
        ..ClientConfig::default()
    };

    if let Some(agent) = lookup("NJUNS_USER_AGENT") {
        config.user_agent = Some(agent);
    }
    if let Some(id) = lookup("NJUNS_CLIENT_ID") {
        config.client_id = id;
    }
    if let Some(secret) = lookup("NJUNS_CLIENT_SECRET") {
        config.client_secret = secret;
    }
    if let Some(value) = lookup("NJUNS_TIMEOUT_SECS") {
        config.timeout_secs = parse_number("NJUNS_TIMEOUT_SECS", &value)?;
    }
    if let Some(value) = lookup("NJUNS_RETRY_MAX_ATTEMPTS") {
        config.retry.max_attempts = parse_number("NJUNS_RETRY_MAX_ATTEMPTS", &value)?;
    }
    if let Some(value) = lookup("NJUNS_RETRY_UNIT_MS") {
        config.retry.unit_millis = parse_number("NJUNS_RETRY_UNIT_MS", &value)?;
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `NjunsError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - A value fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(NjunsError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            NjunsError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| NjunsError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `NjunsError::Config` if format is invalid or parsing fails.
pub fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| NjunsError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| NjunsError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(NjunsError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory and its parent, then the
/// executable's directory.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn has_env_selector<F>(lookup: &F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup("NJUNS_ENVIRONMENT").is_some() || lookup("NJUNS_BASE_URL").is_some()
}

fn parse_number<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| NjunsError::Config(format!("Invalid value for {key}: {e}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let config = load_from_env_with(lookup(&[
            ("NJUNS_ENVIRONMENT", "uat"),
            ("NJUNS_USER_AGENT", "ops-bot/2.0"),
            ("NJUNS_CLIENT_ID", "my-client"),
            ("NJUNS_CLIENT_SECRET", "my-secret"),
            ("NJUNS_TIMEOUT_SECS", "10"),
            ("NJUNS_RETRY_MAX_ATTEMPTS", "3"),
            ("NJUNS_RETRY_UNIT_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.environment, EnvironmentKind::Uat);
        assert_eq!(config.user_agent.as_deref(), Some("ops-bot/2.0"));
        assert_eq!(config.client_id, "my-client");
        assert_eq!(config.client_secret, "my-secret");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.unit_millis, 250);
    }

    #[test]
    fn test_base_url_alone_selects_custom() {
        let config =
            load_from_env_with(lookup(&[("NJUNS_BASE_URL", "http://localhost:8080/app/rest/v2")]))
                .unwrap();

        assert_eq!(config.environment, EnvironmentKind::Custom);
        assert_eq!(
            config.environment().unwrap().base_url(),
            "http://localhost:8080/app/rest/v2"
        );
    }

    #[test]
    fn test_load_from_env_missing_selector() {
        let err = load_from_env_with(lookup(&[("NJUNS_CLIENT_ID", "x")])).unwrap_err();
        assert!(matches!(err, NjunsError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let err = load_from_env_with(lookup(&[
            ("NJUNS_ENVIRONMENT", "production"),
            ("NJUNS_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("NJUNS_TIMEOUT_SECS"));
    }

    #[test]
    fn test_load_from_env_rejects_unknown_environment() {
        let err = load_from_env_with(lookup(&[("NJUNS_ENVIRONMENT", "staging")])).unwrap_err();
        assert!(err.to_string().contains("staging"));
    }

    #[test]
    fn test_custom_environment_requires_base_url() {
        let err = load_from_env_with(lookup(&[("NJUNS_ENVIRONMENT", "custom")])).unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_load_from_file_json() {
        let json_content = r#"{
            "environment": "custom",
            "base_url": "http://127.0.0.1:9000/app/rest/v2",
            "timeout_secs": 5,
            "retry": { "max_attempts": 2 }
        }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let config = load_from_file(Some(path.clone())).unwrap();
        assert_eq!(config.environment, EnvironmentKind::Custom);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.unit_millis, 1_000);
        assert_eq!(config.client_id, "client");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_parse_config_rejects_unknown_extension() {
        let err = parse_config("", Path::new("njuns.yaml")).unwrap_err();
        assert!(err.to_string().contains("Unsupported config format"));
    }

    #[test]
    fn test_load_from_file_missing() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/njuns.toml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
