//! Tracing initialization
//!
//! Logs go to stderr so stdout carries only command output. The filter comes
//! from `NJUNS_LOG`, then `RUST_LOG`, defaulting to `warn`.
//! `NJUNS_LOG_FORMAT=json` switches to one JSON object per line.

use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber filtered by `NJUNS_LOG` or `RUST_LOG`.
pub fn init() {
    let env_filter = EnvFilter::try_from_env("NJUNS_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let json = std::env::var("NJUNS_LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(std::io::stderr);
    let result = if json { builder.json().try_init() } else { builder.try_init() };

    if let Err(err) = result {
        eprintln!("failed to initialise logging: {err}");
    }
}
