//! Lifecycle Service
//!
//! Parses the command line, resolves cluster access, builds the logger and
//! runs the lifecycle server until SIGINT/SIGTERM.
//!
//! # Architecture Overview
//!
//! ```text
//!   argv ──▶ cli::Cli ──▶ Options::validate ──▶ ServiceConfig
//!                                                   │
//!                                                   ▼
//!   KubeconfigResolver ──────────────▶ lifecycle::startup::run ◀──── CancellationToken
//!                                         │        │                  ▲
//!                          build_logger ◀─┘        ▼                  │
//!                                          ServerOptions        signals (SIGTERM/SIGINT)
//!                                                   │
//!                                                   ▼
//!                                   LifecycleServer::start (HTTP API + scheduler)
//! ```

use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use lifecycle_service::cli::Cli;
use lifecycle_service::lifecycle::{cancel_on_shutdown, stop_watcher};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let ctx = CancellationToken::new();
    let signals = cancel_on_shutdown(ctx.clone());

    let result = cli.execute(ctx.clone()).await;

    ctx.cancel();
    stop_watcher(signals).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
