//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGINT/SIGTERM (Ctrl+C on other platforms)
//! - Translate the first signal into cancellation of the execution context
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Cancellation is cooperative: the server decides how to wind down

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancel `ctx` on the first shutdown signal.
///
/// The returned task also exits if `ctx` is cancelled by someone else.
pub fn cancel_on_shutdown(ctx: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = shutdown_signal() => match result {
                Ok(signal) => {
                    tracing::info!(signal, "Shutdown signal received");
                    ctx.cancel();
                }
                Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signals"),
            },
            _ = ctx.cancelled() => {}
        }
    })
}

/// Wait for the watcher returned by [`cancel_on_shutdown`] to exit.
///
/// A watcher that panicked or was aborted is logged, not propagated.
pub async fn stop_watcher(watcher: JoinHandle<()>) {
    if let Err(e) = watcher.await {
        tracing::error!(error = %e, "Signal watcher terminated abnormally");
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = terminate.recv() => Ok("SIGTERM"),
        _ = interrupt.recv() => Ok("SIGINT"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
