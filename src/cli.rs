//! Command-line entry point.
//!
//! Builds the `lifecycle-service` command from `Options` and binds its
//! execution to the run sequence.

use std::path::Path;

use clap::{CommandFactory, Parser};
use tokio_util::sync::CancellationToken;

use crate::config::{KubeconfigResolver, Options};
use crate::lifecycle::{startup, RunError};
use crate::service::{LifecycleServer, ServerError};

#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "lifecycle-service")]
#[command(about = "Schedules lifecycle scans for cluster resources", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub options: Options,
}

/// The `lifecycle-service` command with every flag registered.
pub fn command() -> clap::Command {
    Cli::command()
}

impl Cli {
    /// Validate the options and run the service until `ctx` is cancelled.
    pub async fn execute(self, ctx: CancellationToken) -> Result<(), RunError<ServerError>> {
        let config = self.options.validate().map_err(RunError::Config)?;
        let resolver = KubeconfigResolver::from_env(config.kubeconfig().map(Path::to_path_buf));
        startup::run(&config, &resolver, LifecycleServer::new, ctx).await
    }
}
