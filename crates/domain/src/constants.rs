//! Domain constants
//!
//! Hosts, protocol limits and retry defaults shared by every layer.

// Environments
/// Production host.
pub const PRODUCTION_HOST: &str = "njuns.com";
/// Production application path.
pub const PRODUCTION_APP: &str = "app";
/// UAT host.
pub const UAT_HOST: &str = "test.njuns.com";
/// UAT application path.
pub const UAT_APP: &str = "app2018";

// OAuth client registered for password grants
/// OAuth client id.
pub const DEFAULT_CLIENT_ID: &str = "client";
/// OAuth client secret.
pub const DEFAULT_CLIENT_SECRET: &str = "secret";

// Paging
/// Largest `limit` the server accepts.
pub const MAX_PAGE_LIMIT: u32 = 50;
/// `limit` sent with predefined queries when none is given.
pub const DEFAULT_QUERY_LIMIT: u32 = 50;

// Request engine
/// Attempts per request, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Backoff unit.
pub const DEFAULT_RETRY_UNIT_MILLIS: u64 = 1_000;
/// Units to wait after a 429.
pub const DEFAULT_RATE_LIMIT_DELAY_UNITS: u32 = 3;
/// Per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
