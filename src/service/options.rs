//! Server options bundle.

use std::time::Duration;

use crate::config::ConnectionConfig;
use crate::observability::Logger;

/// Everything the server needs to run, assembled once at startup.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub cfg: ConnectionConfig,
    pub log: Logger,
    /// Bind host; empty binds every interface.
    pub host: String,
    pub port: u16,
    /// Default namespace for scans.
    pub namespace: String,
    /// Allowed lag before a scan is reported as late.
    pub horizon: Duration,
    pub workers: usize,
    pub queue_capacity: usize,
}

impl ServerOptions {
    /// `host:port` suitable for binding a listener.
    pub fn bind_address(&self) -> String {
        match self.host.as_str() {
            "" => format!("0.0.0.0:{}", self.port),
            host if host.contains(':') && !host.starts_with('[') => format!("[{}]:{}", host, self.port),
            host => format!("{}:{}", host, self.port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigSource;
    use crate::observability::{build_logger, LogFormat, LogLevel};

    fn options(host: &str) -> ServerOptions {
        ServerOptions {
            cfg: ConnectionConfig::new(ConfigSource::InCluster, "https://10.0.0.1:443"),
            log: build_logger(LogFormat::Json, LogLevel::Info, false),
            host: host.into(),
            port: 8080,
            namespace: "default".into(),
            horizon: Duration::from_secs(1800),
            workers: 5,
            queue_capacity: 1024,
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(options("").bind_address(), "0.0.0.0:8080");
        assert_eq!(options("127.0.0.1").bind_address(), "127.0.0.1:8080");
        assert_eq!(options("::1").bind_address(), "[::1]:8080");
        assert_eq!(options("localhost").bind_address(), "localhost:8080");
    }
}
