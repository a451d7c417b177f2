//! Call-site facade over the hub
//!
//! Captures file and line through `#[track_caller]` and stamps the source
//! type once per logger instead of at every call.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use logfan_pipeline::{LogHub, Logger};
//!
//! struct OrderService;
//!
//! let hub = Arc::new(LogHub::new());
//! let log = Logger::for_type::<OrderService>(hub);
//! log.info("place", "order accepted").unwrap();
//! ```

use std::panic::Location;
use std::sync::Arc;

use logfan_protocol::{LogEvent, LogLevel, SourceType};

use crate::error::DeliveryError;
use crate::hub::LogHub;

/// Builds events at the call site and hands them to a hub
#[derive(Clone, Debug)]
pub struct Logger {
    hub: Arc<LogHub>,
    source: Option<SourceType>,
}

impl Logger {
    /// Logger without a source type; the method alone is the grouping key
    pub fn new(hub: Arc<LogHub>) -> Self {
        Self { hub, source: None }
    }

    /// Logger on behalf of `T`
    pub fn for_type<T: ?Sized>(hub: Arc<LogHub>) -> Self {
        Self::new(hub).with_source(SourceType::of::<T>())
    }

    /// Set the source type stamped on every event
    #[must_use]
    pub fn with_source(mut self, source: SourceType) -> Self {
        self.source = Some(source);
        self
    }

    /// Source type stamped on every event
    pub fn source(&self) -> Option<&SourceType> {
        self.source.as_ref()
    }

    /// Hub events are sent to
    pub fn hub(&self) -> &Arc<LogHub> {
        &self.hub
    }

    /// Build an event at the caller's location and distribute it
    #[track_caller]
    pub fn log(
        &self,
        level: LogLevel,
        method: &str,
        message: impl Into<String>,
    ) -> Result<(), DeliveryError> {
        let location = Location::caller();
        let mut event = LogEvent::new(level, message)
            .with_method(method)
            .with_location(location.file(), location.line());
        if let Some(source) = &self.source {
            event = event.with_source(source.clone());
        }
        self.hub.distribute(&event)
    }

    #[track_caller]
    pub fn trace(&self, method: &str, message: impl Into<String>) -> Result<(), DeliveryError> {
        self.log(LogLevel::Trace, method, message)
    }

    #[track_caller]
    pub fn debug(&self, method: &str, message: impl Into<String>) -> Result<(), DeliveryError> {
        self.log(LogLevel::Debug, method, message)
    }

    #[track_caller]
    pub fn info(&self, method: &str, message: impl Into<String>) -> Result<(), DeliveryError> {
        self.log(LogLevel::Info, method, message)
    }

    #[track_caller]
    pub fn warning(&self, method: &str, message: impl Into<String>) -> Result<(), DeliveryError> {
        self.log(LogLevel::Warning, method, message)
    }

    #[track_caller]
    pub fn error(&self, method: &str, message: impl Into<String>) -> Result<(), DeliveryError> {
        self.log(LogLevel::Error, method, message)
    }
}
