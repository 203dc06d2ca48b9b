//! reqwest implementation of the HTTP transport port

use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use njuns_core::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError, TransportErrorKind,
};
use njuns_domain::constants::DEFAULT_TIMEOUT_SECS;
use njuns_domain::NjunsError;
use reqwest::{Client as ReqwestClient, Method};
use tokio::sync::Mutex;
use tracing::debug;

/// Single-shot HTTP transport over reqwest.
///
/// Retries and authentication belong to the request engine; this type sends
/// exactly one request per call. The underlying connection pool is created
/// on first use and dropped by [`HttpTransport::close`].
pub struct HttpClient {
    settings: HttpClientBuilder,
    client: Mutex<Option<ReqwestClient>>,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    ///
    /// # Errors
    /// Returns `NjunsError::Config` if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, NjunsError> {
        Self::builder().build()
    }

    async fn client(&self) -> Result<ReqwestClient, TransportError> {
        let mut slot = self.client.lock().await;
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }
        let client = self
            .settings
            .reqwest_client()
            .map_err(|err| TransportError::new(TransportErrorKind::Other, err.to_string()))?;
        *slot = Some(client.clone());
        Ok(client)
    }
}

#[async_trait]
impl HttpTransport for HttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let client = self.client().await?;

        let mut builder = client.request(to_reqwest_method(request.method), request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(classify_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(classify_error)?;
        debug!(status, bytes = body.len(), "received HTTP response");

        Ok(HttpResponse { status, headers, body })
    }

    async fn close(&self) {
        if self.client.lock().await.take().is_some() {
            debug!("released HTTP connection pool");
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: None,
        }
    }
}

impl HttpClientBuilder {
    /// Per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Default `User-Agent`; the engine's header overrides it per request.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client, checking the settings eagerly.
    ///
    /// # Errors
    /// Returns `NjunsError::Config` if reqwest rejects the settings.
    pub fn build(self) -> Result<HttpClient, NjunsError> {
        let client = self
            .reqwest_client()
            .map_err(|err| NjunsError::Config(format!("failed to build HTTP client: {err}")))?;
        Ok(HttpClient { settings: self, client: Mutex::new(Some(client)) })
    }

    fn reqwest_client(&self) -> Result<ReqwestClient, reqwest::Error> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        builder.build()
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Map a reqwest failure onto the transport error kinds the engine retries on.
///
/// The message never carries the request URL, whose query may hold
/// credentials.
fn classify_error(err: reqwest::Error) -> TransportError {
    let kind = match io_error_kind(&err) {
        Some(ErrorKind::ConnectionReset) => TransportErrorKind::ConnectionReset,
        Some(ErrorKind::ConnectionRefused) => TransportErrorKind::ConnectionRefused,
        Some(ErrorKind::ConnectionAborted) => TransportErrorKind::ConnectionAborted,
        Some(ErrorKind::TimedOut) => TransportErrorKind::Timeout,
        _ if err.is_timeout() => TransportErrorKind::Timeout,
        _ => TransportErrorKind::Other,
    };
    TransportError::new(kind, describe(err.without_url()))
}

/// Error text with its source chain, e.g. `error sending request: tcp connect
/// error: Connection refused`.
fn describe(err: reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(current) = source {
        message.push_str(": ");
        message.push_str(&current.to_string());
        source = current.source();
    }
    message
}

fn io_error_kind(err: &reqwest::Error) -> Option<ErrorKind> {
    let mut source = std::error::Error::source(err);
    while let Some(current) = source {
        if let Some(io) = current.downcast_ref::<std::io::Error>() {
            return Some(io.kind());
        }
        source = current.source();
    }
    None
}
