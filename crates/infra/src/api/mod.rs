//! NJUNS API façade
//!
//! [`NjunsClient`] wraps the request engine with one method per endpoint:
//! entities, predefined queries, middleware services and the user profile.

pub mod client;
pub mod entities;
pub mod queries;
pub mod services;

pub use client::{NjunsClient, NjunsClientBuilder};
