//! Request/session engine
//!
//! A façade call builds a [`route::Route`], the [`engine::RequestEngine`]
//! resolves it against the configured base URL, attaches (and if needed
//! refreshes) the bearer token, sends it through the transport port with
//! retries, and classifies the outcome into a body or a
//! [`errors::RequestError`].

pub mod auth;
pub mod engine;
pub mod errors;
pub mod query;
pub mod retry;
pub mod route;
pub mod session;
