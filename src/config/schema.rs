//! Configuration schema definitions.
//!
//! `Options` is the raw record the command line is parsed into. Every field
//! maps to exactly one flag. Values are checked only by their flag type here;
//! semantic checks live in `validation.rs`.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

/// Operator-tunable parameters of a single service run.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct Options {
    /// Path to kubeconfig file
    #[arg(long, value_name = "PATH")]
    pub kubeconfig: Option<PathBuf>,

    /// Logging level (debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Logging format (json, text)
    #[arg(long, value_name = "FORMAT", default_value = "json")]
    pub log_format: String,

    /// Bind host
    #[arg(long, default_value = "")]
    pub host: String,

    /// Bind port
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Default namespace name
    #[arg(long, default_value = "default")]
    pub namespace: String,

    /// Allowed lag for scan period check
    #[arg(long, value_name = "DURATION", default_value = "30m", value_parser = parse_duration)]
    pub horizon: Duration,

    /// Number of workers to process tasks
    #[arg(long, default_value_t = 5)]
    pub workers: usize,

    /// Size of the scheduler's queue
    #[arg(long, default_value_t = 1024)]
    pub queue_capacity: usize,

    /// Development mode flag
    #[arg(long)]
    pub dev: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            log_level: "info".to_string(),
            log_format: "json".to_string(),
            host: String::new(),
            port: 8080,
            namespace: "default".to_string(),
            horizon: Duration::from_secs(30 * 60),
            workers: 5,
            queue_capacity: 1024,
            dev: false,
        }
    }
}

const NANOS_PER_UNIT: [(&str, u64); 7] = [
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60 * 1_000_000_000),
    ("h", 60 * 60 * 1_000_000_000),
];

/// Parse a duration such as `30m`, `1h30m`, `1.5h` or `250ms`.
///
/// A bare `0` is accepted; any other number needs a unit.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let input = raw.trim();
    if input == "0" {
        return Ok(Duration::ZERO);
    }
    if input.is_empty() {
        return Err("empty duration".to_string());
    }

    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut rest = input;
    let mut total: u64 = 0;

    while !rest.is_empty() {
        let number_len = rest.find(|c: char| !is_number(c)).unwrap_or(rest.len());
        if number_len == 0 {
            return Err(format!("invalid duration {raw:?}: expected a number"));
        }
        let (number, tail) = rest.split_at(number_len);
        let value: f64 = number
            .parse()
            .map_err(|_| format!("invalid duration {raw:?}: bad number {number:?}"))?;

        let unit_len = tail.find(is_number).unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        if unit.is_empty() {
            return Err(format!("invalid duration {raw:?}: missing unit"));
        }
        let scale = NANOS_PER_UNIT
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, nanos)| *nanos)
            .ok_or_else(|| format!("invalid duration {raw:?}: unknown unit {unit:?}"))?;

        let nanos = (value * scale as f64).round();
        if nanos >= u64::MAX as f64 {
            return Err(format!("invalid duration {raw:?}: out of range"));
        }
        total = total
            .checked_add(nanos as u64)
            .ok_or_else(|| format!("invalid duration {raw:?}: out of range"))?;
        rest = tail;
    }

    Ok(Duration::from_nanos(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("30m"), Ok(Duration::from_secs(1800)));
        assert_eq!(parse_duration("1h30m"), Ok(Duration::from_secs(5400)));
        assert_eq!(parse_duration("1.5h"), Ok(Duration::from_secs(5400)));
        assert_eq!(parse_duration("90s"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("10us"), Ok(Duration::from_micros(10)));
        assert_eq!(parse_duration("7ns"), Ok(Duration::from_nanos(7)));
        assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        for raw in ["", "30", "m", "10x", "ten minutes", "1h-5m", "1..5s"] {
            assert!(parse_duration(raw).is_err(), "{raw:?} should be rejected");
        }
    }
}
