//! Client configuration structures
//!
//! Loaded by `njuns-infra::config` from the environment or a TOML/JSON file.
//! Every field has a default so partial files are accepted.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CLIENT_ID, DEFAULT_CLIENT_SECRET, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_RATE_LIMIT_DELAY_UNITS, DEFAULT_RETRY_UNIT_MILLIS, DEFAULT_TIMEOUT_SECS,
    PRODUCTION_APP, PRODUCTION_HOST, UAT_APP, UAT_HOST,
};
use crate::errors::{NjunsError, Result};

/// Build the REST base URL for a host/app pair.
pub fn api_base_url(host: &str, app: &str) -> String {
    format!("https://{host}/{app}/rest/v2")
}

/// Which NJUNS deployment a client talks to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Production,
    Uat,
    /// Any other base URL, e.g. a proxy or a local mock server.
    Custom(String),
}

impl Environment {
    /// Fully qualified REST base URL, without a trailing slash.
    pub fn base_url(&self) -> String {
        match self {
            Self::Production => api_base_url(PRODUCTION_HOST, PRODUCTION_APP),
            Self::Uat => api_base_url(UAT_HOST, UAT_APP),
            Self::Custom(url) => url.trim_end_matches('/').to_string(),
        }
    }

    /// Selector for this environment.
    pub fn kind(&self) -> EnvironmentKind {
        match self {
            Self::Production => EnvironmentKind::Production,
            Self::Uat => EnvironmentKind::Uat,
            Self::Custom(_) => EnvironmentKind::Custom,
        }
    }
}

/// Serialized selector for [`Environment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentKind {
    #[default]
    Production,
    Uat,
    Custom,
}

impl std::str::FromStr for EnvironmentKind {
    type Err = NjunsError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "uat" | "test" => Ok(Self::Uat),
            "custom" => Ok(Self::Custom),
            other => Err(NjunsError::Config(format!(
                "Unknown environment '{other}', expected production, uat or custom"
            ))),
        }
    }
}

/// Retry budget and delays for the request engine.
///
/// Delays are expressed in multiples of `unit_millis`: a rate-limited
/// response waits `rate_limit_delay_units`, a retryable server error waits
/// `1 + 2 * attempt` units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub unit_millis: u64,
    pub rate_limit_delay_units: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            unit_millis: DEFAULT_RETRY_UNIT_MILLIS,
            rate_limit_delay_units: DEFAULT_RATE_LIMIT_DELAY_UNITS,
        }
    }
}

impl RetryConfig {
    /// Backoff unit as a duration.
    pub fn unit(&self) -> Duration {
        Duration::from_millis(self.unit_millis)
    }
}

/// Configuration for one client instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub environment: EnvironmentKind,
    /// Required when `environment` is `custom`, ignored otherwise.
    pub base_url: Option<String>,
    /// Client identifier header; a crate-versioned default is used when unset.
    pub user_agent: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    pub timeout_secs: u64,
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: EnvironmentKind::Production,
            base_url: None,
            user_agent: None,
            client_id: DEFAULT_CLIENT_ID.to_string(),
            client_secret: DEFAULT_CLIENT_SECRET.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at an explicit base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            environment: EnvironmentKind::Custom,
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    /// Resolve the configured environment.
    ///
    /// # Errors
    /// Returns `NjunsError::Config` when `custom` is selected without a
    /// `base_url`.
    pub fn environment(&self) -> Result<Environment> {
        match self.environment {
            EnvironmentKind::Production => Ok(Environment::Production),
            EnvironmentKind::Uat => Ok(Environment::Uat),
            EnvironmentKind::Custom => match self.base_url.as_deref().map(str::trim) {
                Some(url) if !url.is_empty() => Ok(Environment::Custom(url.to_string())),
                _ => Err(NjunsError::Config(
                    "base_url is required for the custom environment".to_string(),
                )),
            },
        }
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    /// Returns `NjunsError::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.environment()?;
        if self.retry.max_attempts == 0 {
            return Err(NjunsError::Config("retry.max_attempts must be at least 1".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(NjunsError::Config("timeout_secs must be at least 1".to_string()));
        }
        if self.client_id.trim().is_empty() {
            return Err(NjunsError::Config("client_id must not be empty".to_string()));
        }
        Ok(())
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Client identifier sent with every request.
    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("njuns-rs/{}", env!("CARGO_PKG_VERSION")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_and_uat_base_urls() {
        assert_eq!(Environment::Production.base_url(), "https://njuns.com/app/rest/v2");
        assert_eq!(Environment::Uat.base_url(), "https://test.njuns.com/app2018/rest/v2");
    }

    #[test]
    fn custom_base_url_strips_trailing_slash() {
        let env = Environment::Custom("http://127.0.0.1:8080/rest/v2/".to_string());
        assert_eq!(env.base_url(), "http://127.0.0.1:8080/rest/v2");
    }

    #[test]
    fn custom_environment_requires_base_url() {
        let config = ClientConfig { environment: EnvironmentKind::Custom, ..Default::default() };
        assert!(matches!(config.environment(), Err(NjunsError::Config(_))));
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let mut config = ClientConfig::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"environment":"uat","retry":{"unit_millis":5}}"#).unwrap();

        assert_eq!(config.environment().unwrap(), Environment::Uat);
        assert_eq!(config.retry.unit_millis, 5);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.client_id, "client");
    }

    #[test]
    fn environment_kind_parses_aliases() {
        assert_eq!("PROD".parse::<EnvironmentKind>().unwrap(), EnvironmentKind::Production);
        assert_eq!("test".parse::<EnvironmentKind>().unwrap(), EnvironmentKind::Uat);
        assert!("staging".parse::<EnvironmentKind>().is_err());
    }
}
