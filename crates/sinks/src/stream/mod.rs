//! Stream Sink - one line per event on stdout, stderr or any writer
//!
//! The pass-through sink: no buffering beyond the writer's own, no deferred
//! work. Each accepted event is formatted and written under a mutex, then
//! the writer is flushed so lines from concurrent producers never interleave.
//!
//! # Example Output
//!
//! ```text
//! [2025-01-15T10:30:45.123Z] [INFO] OrderService.place: order 1234 accepted
//! [2025-01-15T10:30:45.130Z] [ERROR] MailClient.connect: connection refused
//! ```

use std::fmt;
use std::io::{self, Write};

use async_trait::async_trait;
use logfan_config::{StreamSinkConfig, StreamTarget};
use logfan_protocol::{LogEvent, LogLevel};
use parking_lot::Mutex;

use crate::{Sink, SinkError};

type Formatter = Box<dyn Fn(&LogEvent) -> String + Send + Sync>;
type Filter = Box<dyn Fn(&LogEvent) -> bool + Send + Sync>;

/// Pass-through sink writing formatted lines to a stream
pub struct StreamSink {
    name: String,
    writer: Mutex<Box<dyn Write + Send>>,
    min_level: LogLevel,
    filter: Option<Filter>,
    formatter: Formatter,
}

impl StreamSink {
    /// Wrap any writer; every level passes and lines use `LogEvent`'s `Display`
    pub fn new(name: impl Into<String>, writer: impl Write + Send + 'static) -> Self {
        Self {
            name: name.into(),
            writer: Mutex::new(Box::new(writer)),
            min_level: LogLevel::Trace,
            filter: None,
            formatter: Box::new(|event| event.to_string()),
        }
    }

    /// Sink writing to stdout
    pub fn stdout(name: impl Into<String>) -> Self {
        Self::new(name, io::stdout())
    }

    /// Sink writing to stderr
    pub fn stderr(name: impl Into<String>) -> Self {
        Self::new(name, io::stderr())
    }

    /// Build from configuration
    pub fn from_config(name: impl Into<String>, config: &StreamSinkConfig) -> Self {
        let sink = match config.target {
            StreamTarget::Stdout => Self::stdout(name),
            StreamTarget::Stderr => Self::stderr(name),
        };
        sink.with_min_level(config.min_level)
    }

    /// Drop events below `level`
    #[must_use]
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Drop events the predicate rejects (applied after the level check)
    #[must_use]
    pub fn with_filter(mut self, filter: impl Fn(&LogEvent) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Replace the line formatter; the newline is appended by the sink
    #[must_use]
    pub fn with_formatter(
        mut self,
        formatter: impl Fn(&LogEvent) -> String + Send + Sync + 'static,
    ) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    /// Minimum accepted level
    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    fn accepts(&self, event: &LogEvent) -> bool {
        event.level().passes(self.min_level) && self.filter.as_ref().is_none_or(|f| f(event))
    }
}

#[async_trait]
impl Sink for StreamSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, event: &LogEvent) -> Result<(), SinkError> {
        if !self.accepts(event) {
            return Ok(());
        }

        let line = (self.formatter)(event);
        let mut writer = self.writer.lock();
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    async fn dispose(&self) -> Result<(), SinkError> {
        self.writer.lock().flush()?;
        Ok(())
    }
}

impl fmt::Debug for StreamSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSink")
            .field("name", &self.name)
            .field("min_level", &self.min_level)
            .field("filtered", &self.filter.is_some())
            .finish_non_exhaustive()
    }
}
