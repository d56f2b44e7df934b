//! Lifecycle server.
//!
//! # Responsibilities
//! - Bind the configured host and port
//! - Serve the HTTP API (health, status, scan submission)
//! - Run the scheduler's worker pool
//! - Stop when the execution context is cancelled

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::instrument::WithSubscriber;

use crate::service::options::ServerOptions;
use crate::service::scheduler::{ScanRequest, ScanTask, Scheduler, SchedulerConfig, SchedulerStats};

/// A long-running service started once per process.
pub trait Server {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run until `ctx` is cancelled or the server fails.
    fn start(self, ctx: CancellationToken) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Error type for server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Static facts reported by `/status`.
#[derive(Debug, Clone, Serialize)]
struct ServiceInfo {
    namespace: String,
    cluster: String,
    horizon_secs: u64,
    workers: usize,
    queue_capacity: usize,
}

/// Application state injected into handlers.
#[derive(Clone)]
struct AppState {
    scheduler: Scheduler,
    info: Arc<ServiceInfo>,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    #[serde(flatten)]
    info: ServiceInfo,
    #[serde(flatten)]
    stats: SchedulerStats,
}

#[derive(Debug, Serialize)]
struct Accepted {
    namespace: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Server handling scans for the managed cluster.
pub struct LifecycleServer {
    options: ServerOptions,
}

impl LifecycleServer {
    pub fn new(options: ServerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ServerOptions {
        &self.options
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/healthz", get(healthz))
            .route("/status", get(status))
            .route("/scans", post(submit_scan))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(30)))
            .layer(TraceLayer::new_for_http())
    }

    async fn run(self, ctx: CancellationToken) -> Result<(), ServerError> {
        let options = self.options;
        let address = options.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        tracing::info!(
            address = %local_addr,
            namespace = %options.namespace,
            cluster = %options.cfg.server,
            source = %options.cfg.source,
            "Server starting"
        );

        let shutdown = ctx.child_token();
        let (scheduler, workers) = Scheduler::spawn(
            SchedulerConfig {
                workers: options.workers,
                queue_capacity: options.queue_capacity,
                horizon: options.horizon,
            },
            shutdown.clone(),
            options.log.dispatch().clone(),
        );

        let info = ServiceInfo {
            namespace: options.namespace.clone(),
            cluster: options.cfg.server.clone(),
            horizon_secs: options.horizon.as_secs(),
            workers: options.workers,
            queue_capacity: scheduler.capacity(),
        };
        let router = Self::build_router(AppState {
            scheduler,
            info: Arc::new(info),
        });

        let signal = shutdown.clone();
        let served = axum::serve(listener, router)
            .with_graceful_shutdown(async move { signal.cancelled().await })
            .await;

        // Stop the workers even if serving failed on its own.
        shutdown.cancel();
        workers.join().await;

        served?;
        tracing::info!("Server stopped");
        Ok(())
    }
}

impl Server for LifecycleServer {
    type Error = ServerError;

    async fn start(self, ctx: CancellationToken) -> Result<(), ServerError> {
        let log = self.options.log.clone();
        if !log.install() {
            log.in_scope(|| tracing::debug!("Global logger already set, keeping it"));
        }
        self.run(ctx).with_subscriber(log.dispatch().clone()).await
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        info: (*state.info).clone(),
        stats: state.scheduler.stats(),
    })
}

async fn submit_scan(State(state): State<AppState>, Json(request): Json<ScanRequest>) -> Response {
    if request.name.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "scan name must not be empty");
    }

    let task = ScanTask {
        namespace: request
            .namespace
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| state.info.namespace.clone()),
        name: request.name,
        enqueued_at: Instant::now(),
    };
    let accepted = Accepted {
        namespace: task.namespace.clone(),
        name: task.name.clone(),
    };

    match state.scheduler.submit(task) {
        Ok(()) => (StatusCode::ACCEPTED, Json(accepted)).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, name = %accepted.name, "Scan rejected");
            error_response(StatusCode::SERVICE_UNAVAILABLE, &e.to_string())
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}
