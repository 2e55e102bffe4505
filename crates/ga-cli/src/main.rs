//! ga-cli - manage Google Analytics 4 accounts, properties and data
//! streams from the command line.

mod cli;
mod commands;
mod context;
mod error;
mod output;
mod utils;
mod validators;

use std::process::ExitCode;

use clap::Parser;
use ga_cli_core::logging::{self, LogConfig};
use tracing::{debug, info};

use cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _logging = logging::init(LogConfig::default());
    info!(version = env!("CARGO_PKG_VERSION"), "ga-cli starting");

    match cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(error = %err.detail(), exit_code = err.exit_code(), "Command failed");
            eprintln!("Error: {}", err.display_message());
            ExitCode::from(err.exit_code())
        }
    }
}
