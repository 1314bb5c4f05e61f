//! Command-line and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use smsrelay_core::{RetryPolicy, SmtpOptions};
use thiserror::Error;

/// Problems with the supplied configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No `--database` and the platform has no data directory.
    #[error("no data directory available; pass --database")]
    NoDataDir,

    /// A numeric setting is out of range.
    #[error("{name} must be {requirement}")]
    OutOfRange {
        /// Flag name.
        name: &'static str,
        /// What the value must satisfy.
        requirement: &'static str,
    },

    /// `--helo-name` is blank or contains whitespace.
    #[error("--helo-name must be a non-empty hostname")]
    InvalidHeloName,

    /// `--log-level` is not a valid filter directive.
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),
}

/// Service configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "smsrelay")]
#[command(author, version, about = "Forward received SMS to email")]
pub struct Config {
    /// Address the HTTP API listens on.
    #[arg(long, env = "SMSRELAY_BIND", default_value = "0.0.0.0:8001")]
    pub bind: SocketAddr,

    /// `SQLite` database file [default: <data dir>/smsrelay/smsrelay.db]
    #[arg(long, env = "SMSRELAY_DATABASE", value_name = "FILE")]
    pub database: Option<PathBuf>,

    /// Log level or filter directive; `RUST_LOG` takes precedence.
    #[arg(long, env = "SMSRELAY_LOG", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, env = "SMSRELAY_JSON_LOGS")]
    pub json_logs: bool,

    /// Timeout for each SMTP command, in seconds.
    #[arg(long, env = "SMSRELAY_SMTP_TIMEOUT_SECS", default_value_t = 30)]
    pub smtp_timeout_secs: u64,

    /// Name announced in EHLO.
    #[arg(long, env = "SMSRELAY_HELO_NAME", default_value = "localhost")]
    pub helo_name: String,

    /// Delivery attempts per SMS, including the first.
    #[arg(long, env = "SMSRELAY_MAX_ATTEMPTS", default_value_t = 3)]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    #[arg(long, env = "SMSRELAY_RETRY_BASE_MS", default_value_t = 500)]
    pub retry_base_ms: u64,

    /// Upper bound on the delay between retries, in milliseconds.
    #[arg(long, env = "SMSRELAY_RETRY_MAX_MS", default_value_t = 5000)]
    pub retry_max_ms: u64,

    /// Validate configuration and exit.
    #[arg(long)]
    pub check: bool,
}

impl Config {
    /// Checks values clap cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.smtp_timeout_secs == 0 {
            return Err(ConfigError::OutOfRange {
                name: "--smtp-timeout-secs",
                requirement: "at least 1",
            });
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::OutOfRange {
                name: "--max-attempts",
                requirement: "at least 1",
            });
        }
        if self.retry_max_ms < self.retry_base_ms {
            return Err(ConfigError::OutOfRange {
                name: "--retry-max-ms",
                requirement: "at least --retry-base-ms",
            });
        }
        let helo = self.helo_name.trim();
        if helo.is_empty() || helo.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidHeloName);
        }
        if tracing_subscriber::EnvFilter::try_new(&self.log_level).is_err() {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }
        Ok(())
    }

    /// Resolves the database file, falling back to the platform data dir.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoDataDir`] when neither is available.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database {
            return Ok(path.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join("smsrelay").join("smsrelay.db"))
            .ok_or(ConfigError::NoDataDir)
    }

    /// SMTP session settings.
    #[must_use]
    pub fn smtp_options(&self) -> SmtpOptions {
        SmtpOptions {
            timeout: Duration::from_secs(self.smtp_timeout_secs),
            helo_name: self.helo_name.trim().to_string(),
        }
    }

    /// Retry schedule for deliveries.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.retry_base_ms),
            Duration::from_millis(self.retry_max_ms),
        )
    }
}
