//! Service subsystem.
//!
//! # Data Flow
//! ```text
//! ServerOptions (connection, logger, bind, scheduling tunables)
//!     → server.rs (bind listener, HTTP API)
//!     → scheduler.rs (bounded queue → worker pool)
//!
//! Cancellation:
//!     context cancelled → stop accepting → drain queue → start() returns
//! ```

pub mod options;
pub mod scheduler;
pub mod server;

pub use options::ServerOptions;
pub use scheduler::{ScanRequest, ScanTask, Scheduler, SchedulerConfig, SchedulerError, SchedulerStats};
pub use server::{LifecycleServer, Server, ServerError};
