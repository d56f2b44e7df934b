//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! --log-level  → LogLevel::lookup (severity rank)
//! --log-format → LogFormat
//! --dev        → call-site diagnostics
//!     → logging::build_logger
//!     → Logger (tracing Dispatch bound to stdout)
//!     → handed to the server inside ServerOptions
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Text format for local development
//! - Logger is constructed once per process and shared by clone

pub mod logging;

pub use logging::{build_logger, build_logger_with_writer, LogFormat, LogLevel, Logger, LoggingError};
