//! Request Engine
//!
//! Issues one logical API call: attaches headers and the bearer token,
//! refreshes an expired token first, retries rate-limited and transient
//! failures within the policy budget, and maps terminal responses to
//! [`RequestError`].

use std::sync::Arc;

use chrono::Duration as ChronoDuration;
use njuns_domain::ClientConfig;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use super::auth::ClientCredentials;
use super::errors::{HttpFailure, RequestError};
use super::retry::{Disposition, RetryPolicy};
use super::route::{ResolvedRoute, Route};
use super::session::{Session, TokenState};
use crate::http::ports::{HttpRequest, HttpResponse, HttpTransport};

/// Expiry pushed out while a refresh is in flight.
const PROVISIONAL_EXPIRY_SECS: i64 = 3600;

const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Per-call options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Serialized as the request body with a JSON content type.
    pub json: Option<Value>,
    /// Extra headers; replace defaults with the same (case-insensitive) name.
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    /// Options carrying a JSON body.
    pub fn json(body: Value) -> Self {
        Self { json: Some(body), headers: Vec::new() }
    }

    /// Add a header that overrides the engine's defaults.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Successful response body
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    /// JSON when the content type says so, text otherwise.
    ///
    /// An empty JSON body (e.g. 204) becomes `null`.
    ///
    /// # Errors
    /// Returns the parse error when a JSON content type carries invalid JSON.
    pub fn from_response(response: &HttpResponse) -> Result<Self, serde_json::Error> {
        if !response.is_json() {
            return Ok(Self::Text(response.body.clone()));
        }
        if response.body.trim().is_empty() {
            return Ok(Self::Json(Value::Null));
        }
        serde_json::from_str(&response.body).map(Self::Json)
    }

    /// A JSON object with an `error` key: the server's own error document.
    pub fn has_error_key(&self) -> bool {
        matches!(self, Self::Json(Value::Object(map)) if map.contains_key("error"))
    }

    /// The body, if it was JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Text bodies become JSON strings.
    pub fn into_json(self) -> Value {
        match self {
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
        }
    }

    /// Deserialize into `T`; text bodies are parsed as JSON.
    ///
    /// # Errors
    /// Returns the deserialization error.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        match self {
            Self::Json(value) => serde_json::from_value(value),
            Self::Text(text) => serde_json::from_str(&text),
        }
    }
}

/// Authenticated request engine for one client session
pub struct RequestEngine {
    transport: Arc<dyn HttpTransport>,
    base_url: RwLock<String>,
    user_agent: String,
    pub(crate) client: ClientCredentials,
    policy: RetryPolicy,
    pub(crate) session: Session,
}

impl RequestEngine {
    /// Start building an engine.
    pub fn builder() -> RequestEngineBuilder {
        RequestEngineBuilder::default()
    }

    /// Base URL routes are resolved against.
    pub async fn base_url(&self) -> String {
        self.base_url.read().await.clone()
    }

    /// Point the engine at another deployment. Tokens are left untouched.
    pub async fn set_base_url(&self, base_url: impl Into<String>) {
        let base_url = base_url.into();
        info!(base_url = %base_url, "setting API base URL");
        *self.base_url.write().await = base_url.trim_end_matches('/').to_string();
    }

    /// Retry policy in use.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// `User-Agent` sent with every request.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Copy of the current tokens.
    pub async fn tokens(&self) -> TokenState {
        self.session.snapshot().await
    }

    /// Whether a non-empty access token is held.
    pub async fn is_authenticated(&self) -> bool {
        self.session.snapshot().await.is_authenticated()
    }

    /// Install previously persisted tokens and reopen the session.
    pub async fn restore_tokens(&self, tokens: TokenState) {
        self.session.replace(tokens).await;
        self.session.reopen();
        debug!("restored session tokens");
    }

    /// Whether `close` was called since the last login.
    pub fn is_closed(&self) -> bool {
        !self.session.is_open()
    }

    /// Forget tokens and release the transport. Calls fail with
    /// [`RequestError::SessionClosed`] until the next login.
    pub async fn close(&self) {
        self.session.mark_closed();
        self.session.clear().await;
        self.transport.close().await;
        info!("session closed");
    }

    /// Bind `route` to the current base URL.
    pub async fn resolve(&self, route: &Route) -> ResolvedRoute {
        route.resolve(&self.base_url.read().await)
    }

    /// Execute `route` and return the parsed success body.
    ///
    /// # Errors
    /// Returns the classified [`RequestError`] once retries are exhausted or a
    /// non-retryable status is seen.
    #[instrument(skip(self, route, options), fields(method = %route.method(), path = route.path()))]
    pub async fn execute(
        &self,
        route: &Route,
        options: RequestOptions,
    ) -> Result<ResponseBody, RequestError> {
        self.ensure_open()?;
        let resolved = self.resolve(route).await;
        self.execute_resolved(&resolved, &options).await
    }

    /// Execute `route` and deserialize the success body into `T`.
    ///
    /// # Errors
    /// As [`RequestEngine::execute`], plus [`RequestError::Decode`] when the
    /// body does not match `T`.
    #[instrument(skip(self, route, options), fields(method = %route.method(), path = route.path()))]
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        route: &Route,
        options: RequestOptions,
    ) -> Result<T, RequestError> {
        self.ensure_open()?;
        let resolved = self.resolve(route).await;
        let body = self.execute_resolved(&resolved, &options).await?;
        body.decode()
            .map_err(|err| RequestError::Decode { route: resolved, message: err.to_string() })
    }

    /// Headers, body and URL for one attempt.
    pub fn build_request(
        &self,
        route: &ResolvedRoute,
        options: &RequestOptions,
        bearer: Option<&str>,
    ) -> HttpRequest {
        let mut headers = vec![("User-Agent".to_string(), self.user_agent.clone())];
        if let Some(token) = bearer {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        let body = match &options.json {
            Some(json) => {
                headers.push(("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()));
                Some(json.to_string())
            }
            None => {
                headers.push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
                None
            }
        };

        for (name, value) in &options.headers {
            match headers.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
                Some(existing) => existing.1.clone_from(value),
                None => headers.push((name.clone(), value.clone())),
            }
        }

        HttpRequest { method: route.method, url: route.url.clone(), headers, body }
    }

    pub(crate) fn ensure_open(&self) -> Result<(), RequestError> {
        if self.session.is_open() {
            Ok(())
        } else {
            Err(RequestError::SessionClosed)
        }
    }

    async fn execute_resolved(
        &self,
        route: &ResolvedRoute,
        options: &RequestOptions,
    ) -> Result<ResponseBody, RequestError> {
        let token = self.ensure_fresh_token().await?;
        self.dispatch(route, options, token.as_deref()).await
    }

    /// Send without consulting the session; used directly by token requests.
    pub(crate) async fn dispatch(
        &self,
        route: &ResolvedRoute,
        options: &RequestOptions,
        bearer: Option<&str>,
    ) -> Result<ResponseBody, RequestError> {
        let request = self.build_request(route, options, bearer);
        self.send_with_retry(route, request).await
    }

    /// Current access token, refreshed first when expired.
    ///
    /// Concurrent callers that observe the same expired token serialize on the
    /// refresh lock; only the first performs the refresh.
    async fn ensure_fresh_token(&self) -> Result<Option<String>, RequestError> {
        let state = self.session.snapshot().await;
        if !state.is_authenticated() {
            return Ok(None);
        }
        if !state.is_expired() {
            return Ok(state.access_token);
        }

        let _guard = self.session.lock_refresh().await;
        let state = self.session.snapshot().await;
        if !state.is_authenticated() {
            return Ok(None);
        }
        if !state.is_expired() {
            return Ok(state.access_token);
        }

        warn!("access token expired, requesting a refresh");
        let previous =
            self.session.extend_expiry(ChronoDuration::seconds(PROVISIONAL_EXPIRY_SECS)).await;
        if let Err(err) = self.refresh_with(&state).await {
            self.session.restore_expiry(previous).await;
            return Err(err);
        }
        Ok(self.session.snapshot().await.access_token)
    }

    async fn send_with_retry(
        &self,
        route: &ResolvedRoute,
        request: HttpRequest,
    ) -> Result<ResponseBody, RequestError> {
        let attempts = self.policy.max_attempts.max(1);

        for attempt in 0..attempts {
            let last = self.policy.is_last_attempt(attempt);
            debug!(attempt = attempt + 1, %route, "sending request");

            let response = match self.transport.send(request.clone()).await {
                Ok(response) => response,
                Err(err) if err.is_transient() && !last => {
                    let delay = self.policy.backoff_delay(attempt);
                    warn!(attempt = attempt + 1, %route, error = %err, ?delay, "socket error, retrying");
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Err(err) => {
                    error!(attempt = attempt + 1, %route, error = %err, "transport failure");
                    return Err(RequestError::Transport { route: route.clone(), source: err });
                }
            };

            let status = response.status;
            debug!(attempt = attempt + 1, %route, status, "received response");

            let parsed = ResponseBody::from_response(&response);
            if response.is_success() {
                return parsed.map_err(|err| RequestError::Decode {
                    route: route.clone(),
                    message: err.to_string(),
                });
            }
            let body = parsed.unwrap_or_else(|_| ResponseBody::Text(response.body.clone()));

            match self.policy.classify(status, &body, attempt) {
                Disposition::Retry { delay, reason } if !last => {
                    warn!(attempt = attempt + 1, %route, status, ?reason, ?delay, "retrying request");
                    tokio::time::sleep(delay).await;
                }
                Disposition::Retry { reason, .. } => {
                    error!(attempts, %route, status, ?reason, "retry budget exhausted");
                    return Err(RequestError::exhausted(route.clone(), status, response.body, attempts));
                }
                Disposition::Success | Disposition::Fail => {
                    debug!(%route, status, "request failed");
                    return Err(RequestError::from_status(route.clone(), status, response.body));
                }
            }
        }

        Err(RequestError::Http(HttpFailure::local(
            route.clone(),
            "retry budget exhausted without a response",
        )))
    }
}

/// Builder for [`RequestEngine`]
#[derive(Default)]
pub struct RequestEngineBuilder {
    transport: Option<Arc<dyn HttpTransport>>,
    config: Option<ClientConfig>,
    base_url: Option<String>,
    user_agent: Option<String>,
    client: Option<ClientCredentials>,
    policy: Option<RetryPolicy>,
}

impl RequestEngineBuilder {
    /// Transport to send through; required.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Defaults for every setting not given explicitly.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Base URL; defaults to the configured environment.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// `User-Agent` header value.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// OAuth client used for token requests.
    pub fn client_credentials(mut self, client: ClientCredentials) -> Self {
        self.client = Some(client);
        self
    }

    /// Retry budget and backoff.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Build the engine
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if no transport was set or the configuration
    /// does not validate.
    pub fn build(self) -> Result<RequestEngine, RequestError> {
        let transport = self
            .transport
            .ok_or_else(|| RequestError::InvalidArgument("HTTP transport not set".to_string()))?;
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let base_url = match self.base_url {
            Some(base_url) => base_url,
            None => config.environment()?.base_url(),
        };

        Ok(RequestEngine {
            transport,
            base_url: RwLock::new(base_url.trim_end_matches('/').to_string()),
            user_agent: self.user_agent.unwrap_or_else(|| config.user_agent()),
            client: self.client.unwrap_or_else(|| ClientCredentials::from_config(&config)),
            policy: self.policy.unwrap_or_else(|| RetryPolicy::from_config(&config.retry)),
            session: Session::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::http::ports::{HttpMethod, TransportError};

    struct NoopTransport;

    #[async_trait]
    impl HttpTransport for NoopTransport {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            Ok(HttpResponse::new(200, ""))
        }
    }

    fn engine() -> RequestEngine {
        RequestEngine::builder()
            .transport(Arc::new(NoopTransport))
            .base_url("https://example.test/rest/v2/")
            .user_agent("njuns-test")
            .build()
            .unwrap()
    }

    fn resolved() -> ResolvedRoute {
        ResolvedRoute::new(HttpMethod::Post, "https://example.test/rest/v2/entities/e")
    }

    #[test]
    fn json_body_sets_content_type() {
        let request =
            engine().build_request(&resolved(), &RequestOptions::json(json!({"a": 1})), Some("tok"));

        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("authorization"), Some("Bearer tok"));
        assert_eq!(request.header("user-agent"), Some("njuns-test"));
        assert_eq!(request.body.as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn no_body_means_form_content_type() {
        let request = engine().build_request(&resolved(), &RequestOptions::default(), None);
        assert_eq!(request.header("Content-Type"), Some(FORM_CONTENT_TYPE));
        assert!(request.header("Authorization").is_none());
        assert!(request.body.is_none());
    }

    #[test]
    fn caller_headers_override_case_insensitively() {
        let options = RequestOptions::default().header("content-type", "text/plain").header("X-Trace", "1");
        let request = engine().build_request(&resolved(), &options, None);

        let content_types: Vec<_> =
            request.headers.iter().filter(|(k, _)| k.eq_ignore_ascii_case("content-type")).collect();
        assert_eq!(content_types.len(), 1);
        assert_eq!(request.header("Content-Type"), Some("text/plain"));
        assert_eq!(request.header("x-trace"), Some("1"));
    }

    #[test]
    fn builder_requires_transport() {
        assert!(matches!(RequestEngine::builder().build(), Err(RequestError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn base_url_trailing_slash_trimmed() {
        assert_eq!(engine().base_url().await, "https://example.test/rest/v2");
    }

    #[test]
    fn switching_base_url_keeps_tokens() {
        tokio_test::block_on(async {
            let engine = engine();
            engine
                .restore_tokens(TokenState { access_token: Some("tok".into()), ..Default::default() })
                .await;

            engine.set_base_url("https://test.njuns.com/app2018/rest/v2/").await;

            assert_eq!(engine.base_url().await, "https://test.njuns.com/app2018/rest/v2");
            assert!(engine.is_authenticated().await);
            let resolved = engine.resolve(&Route::get("/userInfo")).await;
            assert_eq!(resolved.url, "https://test.njuns.com/app2018/rest/v2/userInfo");
        });
    }

    #[test]
    fn empty_json_body_decodes_as_null() {
        let response = HttpResponse::new(204, "").with_header("Content-Type", "application/json");
        assert_eq!(ResponseBody::from_response(&response).unwrap(), ResponseBody::Json(Value::Null));
    }

    #[test]
    fn error_key_detection() {
        assert!(ResponseBody::Json(json!({"error": "x"})).has_error_key());
        assert!(!ResponseBody::Json(json!(["error"])).has_error_key());
        assert!(!ResponseBody::Text("error".into()).has_error_key());
    }
}
