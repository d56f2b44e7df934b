//! Bounded scan queue with a fixed worker pool.
//!
//! # Responsibilities
//! - Accept scan tasks up to the queue capacity (backpressure)
//! - Process queued tasks on `workers` concurrent tasks
//! - Flag tasks that waited longer than the horizon
//! - Drain the queue once the context is cancelled

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;
use tracing::Dispatch;

/// Largest queue a bounded channel can hold.
pub const MAX_QUEUE_CAPACITY: usize = tokio::sync::Semaphore::MAX_PERMITS;

/// Error type for task submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("scheduler queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("scheduler is shut down")]
    Closed,
}

/// A request to scan a named resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub name: String,
    /// Falls back to the server's default namespace.
    #[serde(default)]
    pub namespace: Option<String>,
}

/// A queued scan.
#[derive(Debug, Clone)]
pub struct ScanTask {
    pub namespace: String,
    pub name: String,
    pub enqueued_at: Instant,
}

/// Worker pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    pub horizon: Duration,
}

#[derive(Debug, Default)]
struct Counters {
    processed: AtomicU64,
    lagging: AtomicU64,
}

/// Point-in-time scheduler statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    pub queued: usize,
    pub processed: u64,
    pub lagging: u64,
}

/// Submission handle. Clone is cheap and shares the queue.
#[derive(Debug, Clone)]
pub struct Scheduler {
    tx: mpsc::Sender<ScanTask>,
    capacity: usize,
    counters: Arc<Counters>,
}

/// The running workers.
///
/// Holds the receiving end of the queue so it stays open while no worker
/// is running.
pub struct Workers {
    tasks: JoinSet<()>,
    rx: Arc<Mutex<mpsc::Receiver<ScanTask>>>,
}

impl Scheduler {
    /// Start the worker pool.
    ///
    /// The queue capacity is clamped to `1..=MAX_QUEUE_CAPACITY`. Workers stop
    /// once `ctx` is cancelled and the queue is empty.
    pub fn spawn(config: SchedulerConfig, ctx: CancellationToken, dispatch: Dispatch) -> (Self, Workers) {
        let capacity = match config.queue_capacity {
            0 => {
                tracing::warn!("queue capacity of 0 is not usable, using 1");
                1
            }
            requested if requested > MAX_QUEUE_CAPACITY => {
                tracing::warn!(
                    requested,
                    max = MAX_QUEUE_CAPACITY,
                    "queue capacity too large, using the maximum"
                );
                MAX_QUEUE_CAPACITY
            }
            requested => requested,
        };
        if config.workers == 0 {
            tracing::warn!("no workers configured, queued scans will not be processed");
        }

        let (tx, rx) = mpsc::channel(capacity);
        let rx = Arc::new(Mutex::new(rx));
        let counters = Arc::new(Counters::default());

        let mut tasks = JoinSet::new();
        for id in 0..config.workers {
            let worker = worker_loop(id, rx.clone(), ctx.clone(), counters.clone(), config.horizon);
            tasks.spawn(worker.with_subscriber(dispatch.clone()));
        }

        tracing::info!(
            workers = config.workers,
            queue_capacity = capacity,
            horizon_secs = config.horizon.as_secs(),
            "Scheduler started"
        );

        (Self { tx, capacity, counters }, Workers { tasks, rx })
    }

    /// Queue a task without waiting. Fails if the queue is full.
    pub fn submit(&self, task: ScanTask) -> Result<(), SchedulerError> {
        self.tx.try_send(task).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SchedulerError::QueueFull {
                capacity: self.capacity,
            },
            mpsc::error::TrySendError::Closed(_) => SchedulerError::Closed,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            queued: self.capacity - self.tx.capacity(),
            processed: self.counters.processed.load(Ordering::Relaxed),
            lagging: self.counters.lagging.load(Ordering::Relaxed),
        }
    }
}

impl Workers {
    /// Wait for every worker to exit.
    pub async fn join(mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Worker terminated abnormally");
            }
        }
        let unprocessed = self.rx.lock().await.len();
        if unprocessed > 0 {
            tracing::warn!(unprocessed, "Scheduler stopped with queued scans");
        }
    }
}

async fn worker_loop(
    id: usize,
    rx: Arc<Mutex<mpsc::Receiver<ScanTask>>>,
    ctx: CancellationToken,
    counters: Arc<Counters>,
    horizon: Duration,
) {
    loop {
        let next = {
            let mut rx = rx.lock().await;
            tokio::select! {
                task = rx.recv() => task,
                _ = ctx.cancelled() => rx.try_recv().ok(),
            }
        };
        let Some(task) = next else {
            break;
        };

        let lag = task.enqueued_at.elapsed();
        if lag > horizon {
            counters.lagging.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                worker = id,
                namespace = %task.namespace,
                name = %task.name,
                lag_secs = lag.as_secs(),
                horizon_secs = horizon.as_secs(),
                "Scan lag exceeds horizon"
            );
        }

        tracing::debug!(
            worker = id,
            namespace = %task.namespace,
            name = %task.name,
            "Processing scan"
        );
        counters.processed.fetch_add(1, Ordering::Relaxed);
    }

    tracing::debug!(worker = id, "Worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str) -> ScanTask {
        ScanTask {
            namespace: "default".into(),
            name: name.into(),
            enqueued_at: Instant::now(),
        }
    }

    fn config(workers: usize, queue_capacity: usize) -> SchedulerConfig {
        SchedulerConfig {
            workers,
            queue_capacity,
            horizon: Duration::from_secs(1800),
        }
    }

    #[tokio::test]
    async fn test_full_queue_rejects() {
        let ctx = CancellationToken::new();
        let (scheduler, workers) = Scheduler::spawn(config(0, 2), ctx.clone(), Dispatch::none());

        assert_eq!(scheduler.submit(task("a")), Ok(()));
        assert_eq!(scheduler.submit(task("b")), Ok(()));
        assert_eq!(
            scheduler.submit(task("c")),
            Err(SchedulerError::QueueFull { capacity: 2 })
        );
        assert_eq!(scheduler.stats().queued, 2);

        ctx.cancel();
        workers.join().await;
    }

    #[tokio::test]
    async fn test_queue_stays_open_without_workers() {
        let ctx = CancellationToken::new();
        let (scheduler, workers) = Scheduler::spawn(config(0, 4), ctx.clone(), Dispatch::none());

        assert_eq!(scheduler.submit(task("a")), Ok(()));
        assert_eq!(scheduler.stats().queued, 1);
        assert_eq!(scheduler.stats().processed, 0);

        ctx.cancel();
        workers.join().await;
    }

    #[tokio::test]
    async fn test_oversized_capacity_is_clamped() {
        let ctx = CancellationToken::new();
        let (scheduler, workers) = Scheduler::spawn(config(1, usize::MAX), ctx.clone(), Dispatch::none());

        assert_eq!(scheduler.capacity(), MAX_QUEUE_CAPACITY);
        assert_eq!(scheduler.submit(task("a")), Ok(()));

        ctx.cancel();
        workers.join().await;
        assert_eq!(scheduler.stats().processed, 1);
    }

    #[tokio::test]
    async fn test_zero_capacity_is_clamped() {
        let ctx = CancellationToken::new();
        let (scheduler, workers) = Scheduler::spawn(config(0, 0), ctx.clone(), Dispatch::none());
        assert_eq!(scheduler.capacity(), 1);
        ctx.cancel();
        workers.join().await;
    }

    #[tokio::test]
    async fn test_workers_drain_queue_on_cancel() {
        let ctx = CancellationToken::new();
        let (scheduler, workers) = Scheduler::spawn(config(3, 64), ctx.clone(), Dispatch::none());

        for i in 0..20 {
            scheduler.submit(task(&format!("machine-{i}"))).unwrap();
        }
        ctx.cancel();
        workers.join().await;

        let stats = scheduler.stats();
        assert_eq!(stats.processed, 20);
        assert_eq!(stats.queued, 0);
        assert_eq!(stats.lagging, 0);
    }

    #[tokio::test]
    async fn test_stale_tasks_count_as_lagging() {
        let ctx = CancellationToken::new();
        let cfg = SchedulerConfig {
            horizon: Duration::ZERO,
            ..config(1, 8)
        };
        let (scheduler, workers) = Scheduler::spawn(cfg, ctx.clone(), Dispatch::none());

        let stale = ScanTask {
            enqueued_at: Instant::now() - Duration::from_millis(50),
            ..task("old")
        };
        scheduler.submit(stale).unwrap();
        ctx.cancel();
        workers.join().await;

        assert_eq!(scheduler.stats().lagging, 1);
    }

    #[test]
    fn test_scan_request_namespace_is_optional() {
        let request: ScanRequest = serde_json::from_str(r#"{"name":"node-1"}"#).unwrap();
        assert_eq!(request.namespace, None);
    }
}
