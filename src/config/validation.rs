//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (clap handles syntactic)
//! - Resolve level and format names into their typed values
//! - Freeze the result into an immutable `ServiceConfig`
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: Options → Result<ServiceConfig, ConfigError>
//! - Runs before the run sequence starts

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::schema::Options;
use crate::observability::logging::{LogFormat, LogLevel, LoggingError};

/// A single rejected option.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("--log-level: {0}")]
    LogLevel(LoggingError),

    #[error("--log-format: {0}")]
    LogFormat(LoggingError),
}

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub errors: Vec<ValidationError>,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration: ")?;
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigError {}

/// Validated service configuration. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    kubeconfig: Option<PathBuf>,
    log_level: LogLevel,
    log_format: LogFormat,
    host: String,
    port: u16,
    namespace: String,
    horizon: Duration,
    workers: usize,
    queue_capacity: usize,
    dev: bool,
}

impl ServiceConfig {
    /// Explicit kubeconfig path, if one was given. An empty path counts as none.
    pub fn kubeconfig(&self) -> Option<&Path> {
        self.kubeconfig.as_deref()
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn horizon(&self) -> Duration {
        self.horizon
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    pub fn dev(&self) -> bool {
        self.dev
    }
}

impl Options {
    /// Check the raw options and freeze them into a `ServiceConfig`.
    pub fn validate(self) -> Result<ServiceConfig, ConfigError> {
        let mut errors = Vec::new();

        let log_level = self
            .log_level
            .parse::<LogLevel>()
            .map_err(|e| errors.push(ValidationError::LogLevel(e)))
            .ok();
        let log_format = self
            .log_format
            .parse::<LogFormat>()
            .map_err(|e| errors.push(ValidationError::LogFormat(e)))
            .ok();

        let (Some(log_level), Some(log_format)) = (log_level, log_format) else {
            return Err(ConfigError { errors });
        };

        Ok(ServiceConfig {
            kubeconfig: self.kubeconfig.filter(|path| !path.as_os_str().is_empty()),
            log_level,
            log_format,
            host: self.host,
            port: self.port,
            namespace: self.namespace,
            horizon: self.horizon,
            workers: self.workers,
            queue_capacity: self.queue_capacity,
            dev: self.dev,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Options::default().validate().unwrap();
        assert_eq!(config.kubeconfig(), None);
        assert_eq!(config.log_level(), LogLevel::Info);
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.host(), "");
        assert_eq!(config.port(), 8080);
        assert_eq!(config.namespace(), "default");
        assert_eq!(config.horizon(), Duration::from_secs(1800));
        assert_eq!(config.workers(), 5);
        assert_eq!(config.queue_capacity(), 1024);
        assert!(!config.dev());
    }

    #[test]
    fn test_reports_every_bad_option() {
        let options = Options {
            log_level: "loud".into(),
            log_format: "xml".into(),
            ..Options::default()
        };
        let err = options.validate().unwrap_err();
        assert_eq!(
            err.errors,
            vec![
                ValidationError::LogLevel(LoggingError::UnknownLevel { value: "loud".into() }),
                ValidationError::LogFormat(LoggingError::UnsupportedFormat { value: "xml".into() }),
            ]
        );
        let message = err.to_string();
        assert!(message.contains("--log-level"));
        assert!(message.contains("--log-format"));
    }

    #[test]
    fn test_single_bad_option() {
        let options = Options {
            log_format: "yaml".into(),
            ..Options::default()
        };
        let err = options.validate().unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert!(matches!(err.errors[0], ValidationError::LogFormat(_)));
    }

    #[test]
    fn test_empty_kubeconfig_counts_as_unset() {
        let options = Options {
            kubeconfig: Some(PathBuf::new()),
            ..Options::default()
        };
        assert_eq!(options.validate().unwrap().kubeconfig(), None);
    }
}
