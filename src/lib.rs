//! Lifecycle service library.

pub mod cli;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod service;

pub use cli::Cli;
pub use config::{Options, ServiceConfig};
pub use lifecycle::{run, RunError};
pub use service::{LifecycleServer, Server, ServerOptions};
