//! Structured logging.
//!
//! # Responsibilities
//! - Map operator-facing level names to severity ranks
//! - Build the service logger from format, level and verbosity
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, text format for humans
//! - The logger is a value handed to the server, not a global
//! - Unknown level or format names are errors, never a silent fallback

use std::fmt;
use std::str::FromStr;

use tracing::Dispatch;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Error type for logger construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoggingError {
    #[error("unknown log level {value:?} (expected one of: debug, info, warn, error)")]
    UnknownLevel { value: String },

    #[error("unsupported log format {value:?} (expected one of: json, text)")]
    UnsupportedFormat { value: String },
}

/// Minimum severity of emitted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Recognized level names, in ascending severity.
const LEVELS: [(&str, LogLevel); 4] = [
    ("debug", LogLevel::Debug),
    ("info", LogLevel::Info),
    ("warn", LogLevel::Warn),
    ("error", LogLevel::Error),
];

impl LogLevel {
    /// Look up a level by its flag name. Returns `None` for unknown names.
    pub fn lookup(name: &str) -> Option<Self> {
        LEVELS
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, level)| *level)
    }

    /// Severity rank; strictly increasing from `Debug` to `Error`.
    pub fn rank(self) -> u8 {
        match self {
            LogLevel::Debug => 0,
            LogLevel::Info => 1,
            LogLevel::Warn => 2,
            LogLevel::Error => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s).ok_or_else(|| LoggingError::UnknownLevel {
            value: s.to_string(),
        })
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Encoding of emitted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Single-line human-readable records.
    Text,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Json => "json",
            LogFormat::Text => "text",
        }
    }
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(LogFormat::Json),
            "text" => Ok(LogFormat::Text),
            other => Err(LoggingError::UnsupportedFormat {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured logger.
///
/// Wraps a `tracing` dispatcher so it can be handed to the server and used
/// from any thread. Cloning is cheap and shares the underlying subscriber.
#[derive(Debug, Clone)]
pub struct Logger {
    dispatch: Dispatch,
    format: LogFormat,
    level: LogLevel,
    verbose: bool,
}

impl Logger {
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Run `f` with this logger as the current thread's default.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Make this logger the process-wide default.
    ///
    /// Returns `false` if a global default was already set.
    pub fn install(&self) -> bool {
        tracing::dispatcher::set_global_default(self.dispatch.clone()).is_ok()
    }
}

/// Build a logger writing to standard output.
pub fn build_logger(format: LogFormat, level: LogLevel, verbose: bool) -> Logger {
    build_logger_with_writer(format, level, verbose, std::io::stdout)
}

/// Build a logger writing to `writer`.
///
/// `verbose` adds the call site (file, line and target) to every record.
pub fn build_logger_with_writer<W>(
    format: LogFormat,
    level: LogLevel,
    verbose: bool,
    writer: W,
) -> Logger
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = LevelFilter::from_level(level.into());

    let dispatch = match format {
        LogFormat::Json => {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_writer(writer)
                .with_file(verbose)
                .with_line_number(verbose)
                .with_target(verbose);
            Dispatch::new(Registry::default().with(filter).with(layer))
        }
        LogFormat::Text => {
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_file(verbose)
                .with_line_number(verbose)
                .with_target(verbose);
            Dispatch::new(Registry::default().with(filter).with(layer))
        }
    };

    Logger {
        dispatch,
        format,
        level,
        verbose,
    }
}
