//! `njuns`: query and update NJUNS from the command line.
//!
//! Credentials come from `--username`/`--password` or `NJUNS_USERNAME` and
//! `NJUNS_PASSWORD`; a `.env` file in the working directory is honoured.

use std::process::ExitCode;

use clap::Parser;
use njuns_core::RequestError;
use tracing::error;

mod args;
mod commands;
mod logging;

use args::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init();

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<RequestError>() {
                Some(request) => error!(
                    category = ?request.category(),
                    status = ?request.status(),
                    "request failed"
                ),
                None => error!(error = %err, "command failed"),
            }
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
