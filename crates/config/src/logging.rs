//! `[log]` section: logfan's own diagnostics
//!
//! This is the fallback channel for failures that cannot go through the hub
//! (watcher delivery failures, retention sweep errors, dispose errors). It
//! always writes to stderr so stdout stays free for stream sinks.

use serde::Deserialize;

/// Rendering of diagnostic records
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Console,
    Json,
}

/// Logging configuration
///
/// ```toml
/// [log]
/// level = "info,logfan_sinks=debug"
/// format = "json"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive; a bare level such as `warn` is the common case
    pub level: String,

    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Console,
        }
    }
}
