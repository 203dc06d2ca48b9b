//! CLI argument definitions using clap
//!
//! Commands:
//! - njuns user-info
//! - njuns entities <entity> [--view --limit --offset --sort]
//! - njuns entity <entity> <id> [--view]
//! - njuns search <entity> --filter <json> [--view --limit]
//! - njuns queries <entity>
//! - njuns query <entity> <name> [--limit --offset --view]
//! - njuns post-comment --ticket-id <uuid> --comment <text> [--file <uuid>...] [--flagged]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

/// Command line client for the NJUNS REST API
#[derive(Parser, Debug)]
#[command(name = "njuns")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Talk to the UAT deployment instead of the configured one
    #[arg(long, global = true)]
    pub uat: bool,

    /// Path to a TOML or JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Login name
    #[arg(long, env = "NJUNS_USERNAME")]
    pub username: String,

    /// Password
    #[arg(long, env = "NJUNS_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands of `njuns`.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the profile of the logged-in user
    UserInfo,

    /// List instances of an entity
    Entities {
        /// Entity name, e.g. njuns$Ticket
        entity: String,
        #[arg(long)]
        view: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
        /// Sort property; prefix with `-` for descending
        #[arg(long, allow_hyphen_values = true)]
        sort: Option<String>,
    },

    /// Load one entity instance
    Entity {
        entity: String,
        id: String,
        #[arg(long)]
        view: Option<String>,
    },

    /// Search an entity with a JSON condition list
    Search {
        entity: String,
        /// One condition object or an array of them
        #[arg(long)]
        filter: String,
        #[arg(long)]
        view: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },

    /// List the predefined queries of an entity
    Queries { entity: String },

    /// Execute a predefined query
    Query {
        entity: String,
        name: String,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
        #[arg(long)]
        view: Option<String>,
    },

    /// Add a posting to a ticket
    PostComment {
        #[arg(long)]
        ticket_id: Uuid,
        #[arg(long)]
        comment: String,
        /// Uploaded file descriptor to attach; repeatable
        #[arg(long = "file")]
        files: Vec<Uuid>,
        #[arg(long)]
        flagged: bool,
    },
}
