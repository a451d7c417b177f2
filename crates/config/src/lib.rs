//! logfan Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Minimal config should just work - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use logfan_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[sinks.console]\ntype = \"stream\"").unwrap();
//! assert_eq!(config.enabled_sinks(), vec!["console"]);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [log]
//! level = "info"
//!
//! [sinks.console]
//! type = "stream"
//! target = "stderr"
//!
//! [sinks.trace_file]
//! type = "rotating_file"
//! base_file_name = "logs/app.log"
//! retention_period_in_days = 14
//!
//! [sinks.alerts]
//! type = "batching_mail"
//! recipients = ["ops@example.com"]
//! ```

mod error;
mod logging;
mod sinks;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat};
pub use sinks::{
    BatchingMailSinkConfig, DEFAULT_INCREMENT_WINDOW_SECONDS, DEFAULT_INITIAL_WINDOW_SECONDS,
    DEFAULT_MAX_LISTED_MESSAGES, DEFAULT_MAX_TRACE_FILE_SIZE, MailSinkConfig,
    RotatingFileSinkConfig, SinkConfig, SinksConfig, StreamSinkConfig, StreamTarget,
};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Internal logging of logfan itself (not the events it routes)
    pub log: LogConfig,

    /// Named sink instances
    pub sinks: SinksConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Checks that required fields are present and numeric options are in
    /// range for every enabled sink.
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Get list of enabled sink names in registration order
    pub fn enabled_sinks(&self) -> Vec<&str> {
        self.sinks
            .iter()
            .filter(|(_, sink)| sink.is_enabled())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
