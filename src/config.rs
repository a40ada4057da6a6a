//! Configuration Module
//!
//! Parses the daemon's command line into a [`Config`].
//!
//! ```text
//! sessiond [OPTIONS] [PORT]
//! ```
//!
//! A bare number is taken as the port, so `sessiond 54321` works as well as
//! `sessiond --port 54321`.

use std::time::Duration;
use thiserror::Error;

use crate::maintenance::DEFAULT_REPORT_INTERVAL;
use crate::storage::MAX_ENTRIES;
use crate::{DEFAULT_HOST, DEFAULT_PORT};

/// Longest accepted report interval (one year).
pub const MAX_REPORT_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Errors produced while reading the command line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A flag was given without its value
    #[error("{0} requires a value")]
    MissingValue(String),

    /// The port is not a number in 1..=65535
    #[error("illegal port number: {0}")]
    IllegalPort(String),

    /// A numeric option is not a positive integer
    #[error("invalid value for {flag}: {value}")]
    InvalidValue { flag: String, value: String },

    /// An argument we do not recognize
    #[error("unknown argument: {0}")]
    UnknownArgument(String),
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// UDP port to listen on
    pub port: u16,
    /// Time between maintenance cycles (sweep + stats line)
    pub report_interval: Duration,
    /// Size cap of the cache
    pub max_entries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            report_interval: DEFAULT_REPORT_INTERVAL,
            max_entries: MAX_ENTRIES,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    /// Start the daemon
    Run(Config),
    /// Print usage and exit
    Help,
    /// Print the version and exit
    Version,
}

impl Config {
    /// Parses configuration from the process arguments.
    pub fn from_args() -> Result<CliAction, ConfigError> {
        Self::parse(std::env::args().skip(1))
    }

    /// Parses configuration from an argument list (program name excluded).
    pub fn parse<I, S>(args: I) -> Result<CliAction, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Config::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--host" | "-h" => {
                    config.host = args.next().ok_or_else(|| ConfigError::MissingValue(arg.clone()))?;
                }
                "--port" | "-p" => {
                    let value = args.next().ok_or_else(|| ConfigError::MissingValue(arg.clone()))?;
                    config.port = parse_port(&value)?;
                }
                "--interval" | "-i" => {
                    let value = args.next().ok_or_else(|| ConfigError::MissingValue(arg.clone()))?;
                    config.report_interval = parse_interval(&arg, &value)?;
                }
                "--max-entries" | "-m" => {
                    let value = args.next().ok_or_else(|| ConfigError::MissingValue(arg.clone()))?;
                    config.max_entries = usize::try_from(parse_positive(&arg, &value)?)
                        .map_err(|_| invalid_value(&arg, &value))?;
                }
                "--help" => return Ok(CliAction::Help),
                "--version" | "-v" => return Ok(CliAction::Version),
                positional if positional.bytes().all(|b| b.is_ascii_digit()) => {
                    config.port = parse_port(positional)?;
                }
                other => return Err(ConfigError::UnknownArgument(other.to_string())),
            }
        }

        Ok(CliAction::Run(config))
    }

    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

fn parse_port(value: &str) -> Result<u16, ConfigError> {
    match value.parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ConfigError::IllegalPort(value.to_string())),
    }
}

fn parse_positive(flag: &str, value: &str) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid_value(flag, value)),
    }
}

fn parse_interval(flag: &str, value: &str) -> Result<Duration, ConfigError> {
    let interval = Duration::from_secs(parse_positive(flag, value)?);
    if interval > MAX_REPORT_INTERVAL {
        return Err(invalid_value(flag, value));
    }
    Ok(interval)
}

fn invalid_value(flag: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        flag: flag.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> Config {
        match Config::parse(args.iter().copied()) {
            Ok(CliAction::Run(config)) => config,
            other => panic!("expected a run config, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let config = run(&[]);
        assert_eq!(config, Config::default());
        assert_eq!(config.port, 54321);
        assert_eq!(config.report_interval, Duration::from_secs(300));
        assert_eq!(config.max_entries, 100_000);
        assert_eq!(config.bind_address(), "0.0.0.0:54321");
    }

    #[test]
    fn test_positional_port() {
        assert_eq!(run(&["6000"]).port, 6000);
    }

    #[test]
    fn test_flags() {
        let config = run(&["-h", "127.0.0.1", "--port", "7000", "-i", "60", "--max-entries", "500"]);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 7000);
        assert_eq!(config.report_interval, Duration::from_secs(60));
        assert_eq!(config.max_entries, 500);
        assert_eq!(config.bind_address(), "127.0.0.1:7000");
    }

    #[test]
    fn test_ipv6_bind_address() {
        let config = run(&["--host", "::1"]);
        assert_eq!(config.bind_address(), "[::1]:54321");
    }

    #[test]
    fn test_illegal_port() {
        assert_eq!(
            Config::parse(["0"]),
            Err(ConfigError::IllegalPort("0".to_string()))
        );
        assert_eq!(
            Config::parse(["--port", "70000"]),
            Err(ConfigError::IllegalPort("70000".to_string()))
        );
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::parse(["--interval", "0"]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(
            Config::parse(["--host"]),
            Err(ConfigError::MissingValue("--host".to_string()))
        );
        assert_eq!(
            Config::parse(["--verbose"]),
            Err(ConfigError::UnknownArgument("--verbose".to_string()))
        );
    }

    #[test]
    fn test_interval_is_capped() {
        assert_eq!(
            Config::parse(["-i", "18446744073709551615"]),
            Err(ConfigError::InvalidValue {
                flag: "-i".to_string(),
                value: "18446744073709551615".to_string(),
            })
        );
        assert!(matches!(
            Config::parse(["--interval", "31536001"]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(run(&["--interval", "31536000"]).report_interval, MAX_REPORT_INTERVAL);
    }

    #[test]
    fn test_max_entries_out_of_range() {
        assert!(matches!(
            Config::parse(["-m", "18446744073709551616"]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(run(&["-m", "1"]).max_entries, 1);
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(Config::parse(["--help"]), Ok(CliAction::Help));
        assert_eq!(Config::parse(["-v"]), Ok(CliAction::Version));
    }
}
