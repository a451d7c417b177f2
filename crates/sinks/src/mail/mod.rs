//! Mail Sink - one notification per qualifying event
//!
//! No pooling: every event at or above the minimum level is rendered with
//! the single-event layout and handed to the [`Notifier`] before `write`
//! returns. Use the batching sink when the same condition can fire in
//! bursts.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use logfan_config::MailSinkConfig;
use logfan_protocol::{LogEvent, LogLevel};

use crate::notify::{NotificationTransport, Notifier, message};
use crate::{Sink, SinkError};

/// Immediate notification sink
pub struct MailSink {
    name: String,
    min_level: LogLevel,
    notifier: Notifier,
}

impl MailSink {
    /// Create a sink sending events at `min_level` and above
    pub fn new(name: impl Into<String>, min_level: LogLevel, notifier: Notifier) -> Self {
        Self {
            name: name.into(),
            min_level,
            notifier,
        }
    }

    /// Build from configuration, sending through `transport`
    pub fn from_config(
        name: impl Into<String>,
        config: &MailSinkConfig,
        transport: Arc<dyn NotificationTransport>,
    ) -> Self {
        let notifier = Notifier::new(config.recipients.clone(), transport)
            .with_retry_backoff(config.retry_backoff)
            .with_disabled(config.disabled);
        Self::new(name, config.min_level, notifier)
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }
}

#[async_trait]
impl Sink for MailSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, event: &LogEvent) -> Result<(), SinkError> {
        if !event.level().passes(self.min_level) {
            return Ok(());
        }
        self.notifier
            .deliver(message::subject(event), message::single_event_body(event))?;
        Ok(())
    }
}

impl fmt::Debug for MailSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailSink")
            .field("name", &self.name)
            .field("min_level", &self.min_level)
            .field("notifier", &self.notifier)
            .finish()
    }
}

#[cfg(test)]
#[path = "mail_test.rs"]
mod mail_test;
