//! Log event record
//!
//! A `LogEvent` is created once at the call site and handed to the hub by
//! reference. Nothing downstream can mutate it; the timestamp assigned in
//! `LogEvent::new` is the one used for display and for batching windows.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::TIMESTAMP_FORMAT;
use crate::level::LogLevel;
use crate::source::SourceType;

/// A single leveled log event
///
/// # Example
///
/// ```
/// use logfan_protocol::{LogEvent, LogLevel, SourceType};
///
/// let event = LogEvent::new(LogLevel::Error, "connection refused")
///     .with_source(SourceType::new("MailClient"))
///     .with_method("connect")
///     .with_location("src/mail.rs", 42);
///
/// assert_eq!(event.grouping_key(), "MailClient.connect");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    message: String,
    level: LogLevel,
    source: Option<SourceType>,
    method: String,
    file_path: String,
    line_number: u32,
    timestamp: DateTime<Utc>,
}

impl LogEvent {
    /// Create an event stamped with the current time
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level,
            source: None,
            method: String::new(),
            file_path: String::new(),
            line_number: 0,
            timestamp: Utc::now(),
        }
    }

    /// Set the type this event is logged on behalf of
    #[must_use]
    pub fn with_source(mut self, source: SourceType) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the method name
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Set the call-site file and line
    #[must_use]
    pub fn with_location(mut self, file_path: impl Into<String>, line_number: u32) -> Self {
        self.file_path = file_path.into();
        self.line_number = line_number;
        self
    }

    /// Override the creation timestamp
    ///
    /// Only meant for replaying recorded events and for tests; live events
    /// keep the instant assigned in `new`.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    #[inline]
    pub fn source(&self) -> Option<&SourceType> {
        self.source.as_ref()
    }

    #[inline]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[inline]
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    #[inline]
    pub fn line_number(&self) -> u32 {
        self.line_number
    }

    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Identity under which repeated events are batched
    ///
    /// `Source.method` when a source type is set, the bare method otherwise.
    pub fn grouping_key(&self) -> String {
        match &self.source {
            Some(source) => format!("{}.{}", source, self.method),
            None => self.method.clone(),
        }
    }
}

/// Renders one line: `[2025-01-15T10:30:45.123Z] [ERROR] Source.method: message`
impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{}] ",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.level
        )?;

        match (&self.source, self.method.is_empty()) {
            (Some(source), false) => write!(f, "{}.{}: ", source, self.method)?,
            (Some(source), true) => write!(f, "{}: ", source)?,
            (None, false) => write!(f, "{}: ", self.method)?,
            (None, true) => {}
        }

        f.write_str(&self.message)
    }
}
