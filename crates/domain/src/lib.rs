//! # NJUNS Domain
//!
//! Domain types for the NJUNS REST client.
//!
//! This crate contains:
//! - Entity, user and predefined query models
//! - Search condition trees used by entity search
//! - Client configuration structures
//! - Domain error type and Result definition
//!
//! ## Architecture
//! - No dependencies on other NJUNS crates
//! - No I/O; pure data and validation

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
