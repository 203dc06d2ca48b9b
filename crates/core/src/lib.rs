//! # NJUNS Core
//!
//! Request/session engine for the NJUNS REST client - no network code.
//!
//! This crate contains:
//! - Route resolution and query-string assembly
//! - The request error taxonomy
//! - Retry policy and token/session state
//! - The Request Engine and the OAuth login flow
//! - The `HttpTransport` port implemented by infrastructure
//!
//! ## Architecture Principles
//! - Only depends on `njuns-domain`
//! - All I/O goes through the `HttpTransport` trait
//! - Retry timing uses `tokio::time`, so tests can run on paused time

pub mod http;
pub mod request;

pub use http::ports::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError, TransportErrorKind,
};
pub use request::auth::{ClientCredentials, Credentials, GrantType, TokenRequest};
pub use request::engine::{RequestEngine, RequestEngineBuilder, RequestOptions, ResponseBody};
pub use request::errors::{ErrorCategory, HttpFailure, RequestError};
pub use request::query::{build_query_string, QueryParams, QueryValue};
pub use request::retry::{Disposition, RetryPolicy, RetryReason};
pub use request::route::{resolve, ParamValue, ResolvedRoute, Route};
pub use request::session::{Session, TokenResponse, TokenState};
