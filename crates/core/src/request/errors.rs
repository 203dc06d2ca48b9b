//! Request error taxonomy
//!
//! Every failure that reached the server carries the resolved route, the
//! HTTP status and the raw body so callers can log or inspect what the
//! backend said.

use std::fmt;

use njuns_domain::NjunsError;
use thiserror::Error;

use super::route::ResolvedRoute;
use crate::http::ports::TransportError;

/// Details of a non-2xx response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFailure {
    pub route: ResolvedRoute,
    pub status: Option<u16>,
    pub body: Option<String>,
    pub message: String,
}

impl HttpFailure {
    /// Failure for a response that carried `status`.
    pub fn new(route: ResolvedRoute, status: u16, body: impl Into<String>, message: impl Into<String>) -> Self {
        Self { route, status: Some(status), body: Some(body.into()), message: message.into() }
    }

    /// Failure raised locally, without a response.
    pub fn local(route: ResolvedRoute, message: impl Into<String>) -> Self {
        Self { route, status: None, body: None, message: message.into() }
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.message)?;
        match self.status {
            Some(status) => write!(f, "{status} {}", self.route)?,
            None => write!(f, "{}", self.route)?,
        }
        match self.body.as_deref() {
            Some(body) if !body.is_empty() => write!(f, " - {body}"),
            _ => Ok(()),
        }
    }
}

/// Categories of request errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Token endpoint rejected the credentials (400/401) or no token could be obtained
    Authentication,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 5xx
    Server,
    /// Any other non-2xx
    Client,
    /// Rejected before any I/O
    InvalidArgument,
    /// No response at all
    Network,
    /// 2xx body with unexpected shape
    Decode,
    /// Client was closed
    Session,
}

/// Errors returned by the request engine
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("{0}")]
    Authentication(HttpFailure),

    #[error("{0}")]
    Forbidden(HttpFailure),

    #[error("{0}")]
    NotFound(HttpFailure),

    #[error("{0}")]
    Server(HttpFailure),

    #[error("{0}")]
    Http(HttpFailure),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Transport error on {route}: {source}")]
    Transport {
        route: ResolvedRoute,
        #[source]
        source: TransportError,
    },

    #[error("Failed to decode response from {route}: {message}")]
    Decode { route: ResolvedRoute, message: String },

    #[error("Session closed; log in again before sending requests")]
    SessionClosed,
}

impl RequestError {
    /// Coarse category, for logging and matching.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::Forbidden(_) => ErrorCategory::Forbidden,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::Server(_) => ErrorCategory::Server,
            Self::Http(_) => ErrorCategory::Client,
            Self::InvalidArgument(_) => ErrorCategory::InvalidArgument,
            Self::Transport { .. } => ErrorCategory::Network,
            Self::Decode { .. } => ErrorCategory::Decode,
            Self::SessionClosed => ErrorCategory::Session,
        }
    }

    /// Whether a later call might succeed without changing anything.
    ///
    /// The engine has already spent its retry budget by the time this error
    /// is returned; this is a hint for callers with their own schedule.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Server(_) => true,
            Self::Transport { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    /// The HTTP failure, for status-carrying variants.
    pub fn failure(&self) -> Option<&HttpFailure> {
        match self {
            Self::Authentication(failure)
            | Self::Forbidden(failure)
            | Self::NotFound(failure)
            | Self::Server(failure)
            | Self::Http(failure) => Some(failure),
            _ => None,
        }
    }

    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        self.failure().and_then(|failure| failure.status)
    }

    /// Route the failed request was sent to.
    pub fn route(&self) -> Option<&ResolvedRoute> {
        match self {
            Self::Transport { route, .. } | Self::Decode { route, .. } => Some(route),
            other => other.failure().map(|failure| &failure.route),
        }
    }

    /// Terminal error for a status that will not be retried further.
    pub(crate) fn from_status(route: ResolvedRoute, status: u16, body: String) -> Self {
        match status {
            403 => Self::Forbidden(HttpFailure::new(route, status, body, "Access is denied")),
            404 => Self::NotFound(HttpFailure::new(route, status, body, "Not found")),
            s if s >= 500 => Self::Server(HttpFailure::new(route, status, body, "Server error")),
            _ => Self::Http(HttpFailure::new(route, status, body, "Request failed")),
        }
    }

    /// Terminal error once the attempt budget is spent on retryable responses.
    pub(crate) fn exhausted(route: ResolvedRoute, status: u16, body: String, attempts: u32) -> Self {
        let message = format!("Gave up after {attempts} attempts");
        if status >= 500 {
            Self::Server(HttpFailure::new(route, status, body, message))
        } else {
            Self::Http(HttpFailure::new(route, status, body, message))
        }
    }
}

impl From<NjunsError> for RequestError {
    fn from(err: NjunsError) -> Self {
        match err {
            NjunsError::InvalidInput(message)
            | NjunsError::Config(message)
            | NjunsError::Serialization(message) => Self::InvalidArgument(message),
        }
    }
}
