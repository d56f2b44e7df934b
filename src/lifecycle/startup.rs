//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve cluster connection settings
//! - Build the logger from the validated configuration
//! - Assemble the server options and start the server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Steps run in order, not concurrently
//! - Errors are returned as produced, with no added context

use tokio_util::sync::CancellationToken;

use crate::config::{ConfigError, ConnectionError, ConnectionResolver, ServiceConfig};
use crate::observability::build_logger;
use crate::service::{Server, ServerOptions};

/// Error type for a service run.
///
/// Every variant is transparent: the wrapped value is the original error.
#[derive(Debug, thiserror::Error)]
pub enum RunError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Config(ConfigError),

    #[error(transparent)]
    Connection(ConnectionError),

    #[error(transparent)]
    Server(E),
}

/// Run the service once.
///
/// Resolves the cluster connection, builds the logger, hands the assembled
/// `ServerOptions` to `make_server` and blocks on the server until it exits
/// or `ctx` is cancelled.
pub async fn run<R, F, S>(
    config: &ServiceConfig,
    resolver: &R,
    make_server: F,
    ctx: CancellationToken,
) -> Result<(), RunError<S::Error>>
where
    R: ConnectionResolver + ?Sized,
    F: FnOnce(ServerOptions) -> S,
    S: Server,
{
    let cfg = resolver.resolve().map_err(RunError::Connection)?;

    let log = build_logger(config.log_format(), config.log_level(), config.dev());
    log.in_scope(|| {
        tracing::info!(
            log_level = %config.log_level(),
            log_format = %config.log_format(),
            cluster = %cfg.server,
            source = %cfg.source,
            "Starting lifecycle service"
        )
    });

    let options = ServerOptions {
        cfg,
        log: log.clone(),
        host: config.host().to_string(),
        port: config.port(),
        namespace: config.namespace().to_string(),
        horizon: config.horizon(),
        workers: config.workers(),
        queue_capacity: config.queue_capacity(),
    };
    let server = make_server(options);

    match server.start(ctx).await {
        Ok(()) => {
            log.in_scope(|| tracing::info!("Lifecycle service stopped"));
            Ok(())
        }
        Err(e) => {
            log.in_scope(|| tracing::error!(error = %e, "Lifecycle service failed"));
            Err(RunError::Server(e))
        }
    }
}
