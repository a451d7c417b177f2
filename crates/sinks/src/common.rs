//! Common types shared by all sinks
//!
//! Every sink implements [`Sink`]: a synchronous `write` called once per
//! event by the hub, and an async `dispose` that releases whatever the sink
//! holds (file handles, background watchers).

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use logfan_protocol::LogEvent;
use thiserror::Error;

use crate::notify::NotifyError;

/// A destination for log events
///
/// Sinks are shared as `Arc<dyn Sink>` between the hub and whoever built
/// them, so all methods take `&self` and implementations synchronize
/// internally.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Name used in delivery errors and diagnostics
    fn name(&self) -> &str;

    /// Accept one event
    ///
    /// Filtering by level happens inside the sink; an event below the
    /// sink's threshold is accepted and ignored.
    fn write(&self, event: &LogEvent) -> Result<(), SinkError>;

    /// Flush and release resources
    ///
    /// After dispose returns, further writes fail with [`SinkError::Closed`]
    /// or are ignored, depending on the sink.
    async fn dispose(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Common sink errors
#[derive(Debug, Error)]
pub enum SinkError {
    /// Sink initialization failed
    #[error("failed to initialize sink: {0}")]
    Init(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Failed to write data
    #[error("write failed: {0}")]
    Write(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Opening the next numbered file failed
    #[error("failed to rotate to '{}': {source}", path.display())]
    Rotation {
        /// File that could not be created
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Notification could not be delivered
    #[error("notification failed: {0}")]
    Notify(#[from] NotifyError),

    /// Sink was disposed
    #[error("sink closed")]
    Closed,

    /// Sink panicked while handling an event
    #[error("sink panicked: {0}")]
    Panicked(String),
}

impl SinkError {
    /// Create an initialization error
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Create a write error
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a rotation error
    pub fn rotation(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Rotation {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod common_test;
