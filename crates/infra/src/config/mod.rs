//! Configuration loading
//!
//! Builds a [`ClientConfig`](njuns_domain::ClientConfig) from environment
//! variables or a TOML/JSON file.

pub mod loader;

// Re-export commonly used items
pub use loader::{
    load, load_from_env, load_from_env_with, load_from_file, load_or_default, parse_config,
    probe_config_paths,
};
