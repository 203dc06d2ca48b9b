//! # NJUNS Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest-backed [`HttpTransport`](njuns_core::HttpTransport)
//! - Configuration loading from the environment and TOML/JSON files
//! - [`NjunsClient`], the façade exposing every NJUNS API operation
//!
//! ## Architecture
//! - Implements traits defined in `njuns-core`
//! - Depends on `njuns-domain` and `njuns-core`
//! - Contains all "impure" code (network and filesystem I/O)

pub mod api;
pub mod config;
pub mod http;

// Re-export commonly used items
pub use api::{NjunsClient, NjunsClientBuilder};
pub use http::{HttpClient, HttpClientBuilder};
