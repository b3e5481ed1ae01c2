//! frp authorization plugin.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │               FRP AUTH PLUGIN                │
//!                         │                                              │
//!   POST /handler?op=..   │  ┌─────────┐    ┌──────────┐    ┌─────────┐  │
//!   ──────────────────────┼─▶│  http   │───▶│ decision │───▶│  http   │──┼──▶ frps
//!          frps           │  │ request │    │  engine  │    │response │  │
//!                         │  └─────────┘    └────┬─────┘    └─────────┘  │
//!                         │                      │ current()             │
//!                         │                 ┌────▼─────┐   ┌──────────┐  │
//!                         │                 │  config  │◀──│ reloader │◀─┼── policy file
//!                         │                 │  store   │   │ (poll)   │  │
//!                         │                 └──────────┘   └──────────┘  │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

use clap::Parser;

use frp_auth_plugin::lifecycle::startup::{self, Args, Settings};
use frp_auth_plugin::observability::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init();

    let settings = match Settings::from_env(args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(e.exit_code());
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_addr = %settings.listen_addr,
        config = %settings.config_path.display(),
        "frp-auth-plugin starting"
    );

    match startup::run(settings).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "frp-auth-plugin stopped");
            ExitCode::from(e.exit_code())
        }
    }
}
