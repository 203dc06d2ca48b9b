//! Error types used throughout the domain layer

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main domain error for NJUNS
///
/// Raised before any network activity: invalid argument combinations,
/// rejected configuration, or values that cannot be (de)serialized.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum NjunsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for domain operations
pub type Result<T> = std::result::Result<T, NjunsError>;
