//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve connection → Build logger → Assemble ServerOptions → Server::start
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Cancel execution context → Server drains and returns
//! ```
//!
//! # Design Decisions
//! - Ordered startup: connection first, then logging, then the server
//! - One execution context per process, passed as the last argument
//! - No retries: the first failure ends the run

pub mod signals;
pub mod startup;

pub use signals::{cancel_on_shutdown, stop_watcher};
pub use startup::{run, RunError};
