//! Sink configuration types
//!
//! Sinks are named instances, allowing multiple sinks of the same type
//! (e.g., a verbose trace file next to an errors-only file). Names are kept
//! sorted, and that order is the hub's registration and fan-out order.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

use logfan_protocol::LogLevel;

/// Default rotation threshold for rotating file sinks (128 MiB)
pub const DEFAULT_MAX_TRACE_FILE_SIZE: u64 = 128 * 1024 * 1024;

/// Default quiet period after the first event of a batch
pub const DEFAULT_INITIAL_WINDOW_SECONDS: u64 = 30;

/// Default extension applied by every later event of a batch
pub const DEFAULT_INCREMENT_WINDOW_SECONDS: u64 = 60;

/// Default number of messages listed verbatim in a summary
pub const DEFAULT_MAX_LISTED_MESSAGES: usize = 10;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Container for all sink configurations
///
/// # Example
///
/// ```toml
/// [sinks.console]
/// type = "stream"
///
/// [sinks.trace_file]
/// type = "rotating_file"
/// base_file_name = "logs/trace.log"
///
/// [sinks.errors_file]
/// type = "rotating_file"
/// base_file_name = "logs/errors.log"
/// min_level = "error"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SinksConfig {
    /// Named sink instances
    #[serde(flatten)]
    sinks: BTreeMap<String, SinkConfig>,
}

impl SinksConfig {
    /// Get a sink by name
    pub fn get(&self, name: &str) -> Option<&SinkConfig> {
        self.sinks.get(name)
    }

    /// Check if a sink exists
    pub fn contains(&self, name: &str) -> bool {
        self.sinks.contains_key(name)
    }

    /// Iterate over all sinks in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SinkConfig)> {
        self.sinks.iter()
    }

    /// Get the number of configured sinks
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Check if no sinks are configured
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Get all sink names
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.sinks.keys()
    }
}

/// Configuration for a single sink instance
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    /// Pass-through sink writing one line per event to stdout or stderr
    Stream(StreamSinkConfig),

    /// Size-rotated, retention-swept numbered files
    RotatingFile(RotatingFileSinkConfig),

    /// One notification per qualifying event
    Mail(MailSinkConfig),

    /// Debounced notifications grouped by source type and method
    BatchingMail(BatchingMailSinkConfig),
}

impl SinkConfig {
    /// Check if the sink is enabled
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Stream(c) => c.enabled,
            Self::RotatingFile(c) => c.enabled,
            Self::Mail(c) => c.enabled,
            Self::BatchingMail(c) => c.enabled,
        }
    }

    /// Get the sink type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Stream(_) => "stream",
            Self::RotatingFile(_) => "rotating_file",
            Self::Mail(_) => "mail",
            Self::BatchingMail(_) => "batching_mail",
        }
    }

    /// Minimum level the sink accepts
    pub fn min_level(&self) -> LogLevel {
        match self {
            Self::Stream(c) => c.min_level,
            Self::RotatingFile(c) => c.min_level,
            Self::Mail(c) => c.min_level,
            Self::BatchingMail(c) => c.min_level,
        }
    }
}

/// Where a stream sink writes
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StreamTarget {
    /// Standard output (default)
    #[default]
    Stdout,
    /// Standard error
    Stderr,
}

/// Stream sink configuration
///
/// # Example
///
/// ```toml
/// [sinks.console]
/// type = "stream"
/// target = "stderr"
/// min_level = "debug"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamSinkConfig {
    /// Whether this sink is enabled
    /// Default: true
    pub enabled: bool,

    /// Output stream
    /// Default: stdout
    pub target: StreamTarget,

    /// Minimum event level written
    /// Default: trace
    pub min_level: LogLevel,
}

impl Default for StreamSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            target: StreamTarget::Stdout,
            min_level: LogLevel::Trace,
        }
    }
}

/// Rotating file sink configuration
///
/// Files are named `<stem>_<NNNN><ext>` next to `base_file_name`.
///
/// # Example
///
/// ```toml
/// [sinks.trace_file]
/// type = "rotating_file"
/// base_file_name = "logs/app.log"
/// max_trace_file_size = 104857600
/// retention_period_in_days = 30
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RotatingFileSinkConfig {
    /// Whether this sink is enabled
    /// Default: true
    pub enabled: bool,

    /// Base path; the numeric suffix is inserted before the extension
    /// Required when enabled
    pub base_file_name: String,

    /// Size in bytes after which the next write starts a new file
    /// Default: 128 MiB
    pub max_trace_file_size: u64,

    /// Age after which rotated files are deleted
    /// Default: keep forever
    pub retention_period_in_days: Option<u32>,

    /// Minimum event level written
    /// Default: trace
    pub min_level: LogLevel,
}

impl RotatingFileSinkConfig {
    /// Retention period as a duration
    pub fn retention(&self) -> Option<Duration> {
        self.retention_period_in_days
            .map(|days| Duration::from_secs(u64::from(days) * SECONDS_PER_DAY))
    }
}

impl Default for RotatingFileSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_file_name: String::new(),
            max_trace_file_size: DEFAULT_MAX_TRACE_FILE_SIZE,
            retention_period_in_days: None,
            min_level: LogLevel::Trace,
        }
    }
}

/// Immediate notification sink configuration
///
/// Every event at or above `min_level` is sent on its own, synchronously.
///
/// # Example
///
/// ```toml
/// [sinks.pager]
/// type = "mail"
/// recipients = ["oncall@example.com"]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailSinkConfig {
    /// Whether this sink is enabled
    /// Default: true
    pub enabled: bool,

    /// Notification recipients
    /// Required when enabled
    pub recipients: Vec<String>,

    /// Minimum event level sent
    /// Default: error
    pub min_level: LogLevel,

    /// Wait before the single retry of a transient transport failure
    /// Default: 1s
    #[serde(with = "humantime_serde")]
    pub retry_backoff: Duration,

    /// Accept events but never send anything
    /// Default: false
    pub disabled: bool,
}

impl Default for MailSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recipients: Vec::new(),
            min_level: LogLevel::Error,
            retry_backoff: Duration::from_secs(1),
            disabled: false,
        }
    }
}

/// Batching notification sink configuration
///
/// # Example
///
/// ```toml
/// [sinks.alerts]
/// type = "batching_mail"
/// recipients = ["ops@example.com"]
/// min_level = "error"
/// initial_window_seconds = 30
/// increment_window_seconds = 60
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchingMailSinkConfig {
    /// Whether this sink is enabled
    /// Default: true
    pub enabled: bool,

    /// Notification recipients
    /// Required when enabled
    pub recipients: Vec<String>,

    /// Minimum event level batched
    /// Default: error
    pub min_level: LogLevel,

    /// Quiet period after the first event of a key
    /// Default: 30
    pub initial_window_seconds: u64,

    /// Deadline extension applied by every later event of a key
    /// Default: 60
    pub increment_window_seconds: u64,

    /// Number of messages listed verbatim in a summary
    /// Default: 10
    pub max_listed_messages: usize,

    /// Wait before the single retry of a transient transport failure
    /// Default: 1s
    #[serde(with = "humantime_serde")]
    pub retry_backoff: Duration,

    /// Accept events but never send anything
    /// Default: false
    pub disabled: bool,
}

impl BatchingMailSinkConfig {
    /// Initial window as a duration
    pub fn initial_window(&self) -> Duration {
        Duration::from_secs(self.initial_window_seconds)
    }

    /// Increment window as a duration
    pub fn increment_window(&self) -> Duration {
        Duration::from_secs(self.increment_window_seconds)
    }
}

impl Default for BatchingMailSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recipients: Vec::new(),
            min_level: LogLevel::Error,
            initial_window_seconds: DEFAULT_INITIAL_WINDOW_SECONDS,
            increment_window_seconds: DEFAULT_INCREMENT_WINDOW_SECONDS,
            max_listed_messages: DEFAULT_MAX_LISTED_MESSAGES,
            retry_backoff: Duration::from_secs(1),
            disabled: false,
        }
    }
}
