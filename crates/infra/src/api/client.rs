//! NJUNS API client
//!
//! Owns one [`RequestEngine`] (and through it one session) plus the
//! profile of the logged-in user. Endpoint operations live in the sibling
//! `entities`, `queries` and `services` modules.

use std::sync::Arc;

use njuns_core::{
    Credentials, HttpTransport, ParamValue, RequestEngine, RequestError, RequestOptions,
    RetryPolicy, Route, TokenState,
};
use njuns_domain::{ClientConfig, Environment, UserInfo};
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::http::HttpClient;

const USER_INFO_PATH: &str = "/userInfo";

/// Client for the NJUNS REST API
///
/// `Send + Sync`; share it behind an `Arc` to issue calls concurrently on
/// one session.
pub struct NjunsClient {
    engine: RequestEngine,
    config: ClientConfig,
    user: RwLock<Option<UserInfo>>,
}

impl NjunsClient {
    /// Create a client over the reqwest transport
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the configuration does not validate.
    pub fn new(config: ClientConfig) -> Result<Self, RequestError> {
        Self::builder().config(config).build()
    }

    /// Start building a client.
    pub fn builder() -> NjunsClientBuilder {
        NjunsClientBuilder::default()
    }

    /// Configuration the client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The underlying engine, for calls the client has no helper for.
    pub fn engine(&self) -> &RequestEngine {
        &self.engine
    }

    /// Log in with the password grant and cache the user profile.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for blank credentials, `Authentication` when the
    /// server rejects them, or whatever loading the profile returned.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<UserInfo, RequestError> {
        let credentials = Credentials::new(username, password)?;

        match self.engine.login(&credentials).await {
            Ok(user) => {
                *self.user.write().await = Some(user.clone());
                Ok(user)
            }
            Err(err) => {
                // A rejected token request leaves the previous session live.
                if !self.engine.is_authenticated().await {
                    *self.user.write().await = None;
                }
                Err(err)
            }
        }
    }

    /// Switch deployments, then log in there.
    ///
    /// # Errors
    ///
    /// As [`NjunsClient::login`].
    pub async fn login_with_environment(
        &self,
        environment: Environment,
        username: &str,
        password: &str,
    ) -> Result<UserInfo, RequestError> {
        self.engine.set_base_url(environment.base_url()).await;
        self.login(username, password).await
    }

    /// Exchange the refresh token for a new access token now.
    ///
    /// # Errors
    ///
    /// `Authentication` when no refresh token is held or it is rejected.
    pub async fn refresh(&self) -> Result<(), RequestError> {
        self.engine.refresh().await
    }

    /// Profile cached by the last successful login or profile fetch.
    pub async fn user(&self) -> Option<UserInfo> {
        self.user.read().await.clone()
    }

    /// Load the profile of the logged-in user and refresh the cache.
    ///
    /// # Errors
    ///
    /// Any [`RequestError`] from `GET /userInfo`.
    pub async fn fetch_user_info(&self) -> Result<UserInfo, RequestError> {
        let user: UserInfo =
            self.engine.execute_json(&Route::get(USER_INFO_PATH), RequestOptions::default()).await?;
        *self.user.write().await = Some(user.clone());
        Ok(user)
    }

    /// Copy of the current tokens.
    pub async fn tokens(&self) -> TokenState {
        self.engine.tokens().await
    }

    /// Whether an access token is held.
    pub async fn is_authenticated(&self) -> bool {
        self.engine.is_authenticated().await
    }

    /// Resume a session from tokens persisted by the caller.
    pub async fn restore_tokens(&self, tokens: TokenState) {
        self.engine.restore_tokens(tokens).await;
    }

    /// Forget the session and release connections.
    pub async fn close(&self) {
        *self.user.write().await = None;
        self.engine.close().await;
        info!("client closed");
    }
}

/// Builder for [`NjunsClient`]
#[derive(Default)]
pub struct NjunsClientBuilder {
    config: Option<ClientConfig>,
    transport: Option<Arc<dyn HttpTransport>>,
    retry_policy: Option<RetryPolicy>,
}

impl NjunsClientBuilder {
    /// Configuration; defaults to production.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the reqwest transport, e.g. with an in-memory fake.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Retry policy; defaults to the configuration's retry section.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the configuration does not validate or
    /// the HTTP client cannot be created.
    pub fn build(self) -> Result<NjunsClient, RequestError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                HttpClient::builder()
                    .timeout(config.timeout())
                    .user_agent(config.user_agent())
                    .build()?,
            ),
        };

        let mut engine = RequestEngine::builder().transport(transport).config(config.clone());
        if let Some(policy) = self.retry_policy {
            engine = engine.retry_policy(policy);
        }

        Ok(NjunsClient { engine: engine.build()?, config, user: RwLock::new(None) })
    }
}

/// Entity, query and service names go into the path verbatim (`njuns$Ticket`),
/// so only identifier characters are accepted.
pub(crate) fn identifier(kind: &str, value: &str) -> Result<ParamValue, RequestError> {
    let valid = !value.is_empty()
        && value.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '-' | '.'));
    if valid {
        Ok(ParamValue::raw(value))
    } else {
        Err(RequestError::InvalidArgument(format!("invalid {kind} name '{value}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_accepts_entity_names() {
        assert_eq!(identifier("entity", "njuns$Ticket").unwrap(), ParamValue::raw("njuns$Ticket"));
        assert!(identifier("query", "ticketsByStatus").is_ok());
    }

    #[test]
    fn identifier_rejects_path_characters() {
        for bad in ["", "a/b", "a?b", "a b", "a{b}"] {
            assert!(matches!(identifier("entity", bad), Err(RequestError::InvalidArgument(_))));
        }
    }

    #[test]
    fn build_rejects_invalid_config() {
        let config = ClientConfig { timeout_secs: 0, ..ClientConfig::default() };
        assert!(matches!(
            NjunsClient::builder().config(config).build(),
            Err(RequestError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn new_client_targets_configured_environment() {
        let client = NjunsClient::new(ClientConfig::default()).unwrap();
        assert_eq!(client.engine().base_url().await, "https://njuns.com/app/rest/v2");
        assert!(!client.is_authenticated().await);
        assert!(client.user().await.is_none());
    }
}
