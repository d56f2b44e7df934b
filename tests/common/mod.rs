//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lifecycle_service::config::{ConfigSource, ConnectionConfig, ConnectionError, ConnectionResolver};
use lifecycle_service::observability::{build_logger_with_writer, LogFormat, LogLevel};
use lifecycle_service::service::{Server, ServerOptions};
use tokio_util::sync::CancellationToken;

pub const CLUSTER: &str = "https://cluster.test:6443";

/// Resolver that always succeeds with a fixed in-cluster connection.
pub struct FixedResolver;

impl ConnectionResolver for FixedResolver {
    fn resolve(&self) -> Result<ConnectionConfig, ConnectionError> {
        Ok(ConnectionConfig::new(ConfigSource::InCluster, CLUSTER))
    }
}

/// Resolver that never finds credentials.
pub struct MissingResolver;

impl ConnectionResolver for MissingResolver {
    fn resolve(&self) -> Result<ConnectionConfig, ConnectionError> {
        Err(ConnectionError::NotFound)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fake server failure {0}")]
pub struct FakeError(pub u32);

#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed,
    Fail(FakeError),
    WaitForCancel,
}

/// Server double that records the options it was built from.
pub struct FakeServer {
    behavior: Behavior,
    started: Arc<AtomicBool>,
}

impl Server for FakeServer {
    type Error = FakeError;

    async fn start(self, ctx: CancellationToken) -> Result<(), FakeError> {
        self.started.store(true, Ordering::SeqCst);
        match self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail(e) => Err(e),
            Behavior::WaitForCancel => {
                ctx.cancelled().await;
                Ok(())
            }
        }
    }
}

/// Builds `FakeServer`s and remembers what they were given.
#[derive(Clone, Default)]
pub struct FakeFactory {
    pub options: Arc<Mutex<Option<ServerOptions>>>,
    pub started: Arc<AtomicBool>,
}

impl FakeFactory {
    pub fn make(&self, behavior: Behavior) -> impl FnOnce(ServerOptions) -> FakeServer {
        let slot = self.options.clone();
        let started = self.started.clone();
        move |options| {
            *slot.lock().unwrap() = Some(options);
            FakeServer { behavior, started }
        }
    }

    pub fn built(&self) -> Option<ServerOptions> {
        self.options.lock().unwrap().clone()
    }

    pub fn was_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}

/// Options for a real server bound to localhost.
pub fn local_server_options(port: u16, workers: usize, queue_capacity: usize) -> ServerOptions {
    ServerOptions {
        cfg: ConnectionConfig::new(ConfigSource::InCluster, CLUSTER),
        log: build_logger_with_writer(LogFormat::Json, LogLevel::Debug, false, std::io::sink),
        host: "127.0.0.1".into(),
        port,
        namespace: "metal".into(),
        horizon: Duration::from_secs(1800),
        workers,
        queue_capacity,
    }
}

/// Poll `/healthz` until the server answers.
pub async fn wait_until_healthy(client: &reqwest::Client, base: &str) {
    for _ in 0..50 {
        if let Ok(res) = client.get(format!("{}/healthz", base)).send().await {
            if res.status().is_success() {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("server at {} never became healthy", base);
}
