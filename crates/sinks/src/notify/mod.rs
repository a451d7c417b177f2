//! Notification delivery
//!
//! The mail and batching sinks compose subjects and bodies; this module gets
//! them to recipients. Transports are blocking and classify their own
//! failures as transient or fatal at the point they happen, so [`Notifier`]
//! can retry without inspecting error chains.
//!
//! ```text
//! [MailSink]     --+
//!                  +--subject/body--> [Notifier] --Notification--> [Transport]
//! [BatchingSink] --+                      |  transient?
//!                                         +-- sleep(retry_backoff), retry once
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Default wait before retrying a transient failure
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// One outbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Addresses the message goes to
    pub recipients: Vec<String>,
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub body: String,
}

/// Whether a failed send is worth repeating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection reset, relay busy, timeout
    Transient,
    /// Rejected recipient, bad credentials, malformed message
    Fatal,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => f.write_str("transient"),
            Self::Fatal => f.write_str("fatal"),
        }
    }
}

/// Failure reported by a [`NotificationTransport`]
#[derive(Debug, Clone, Error)]
#[error("{kind} transport error: {message}")]
pub struct TransportError {
    /// Retry classification
    pub kind: TransportErrorKind,
    /// Human-readable cause
    pub message: String,
}

impl TransportError {
    /// Create a transient error
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Transient,
            message: message.into(),
        }
    }

    /// Create a fatal error
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Fatal,
            message: message.into(),
        }
    }

    /// Check if a retry may succeed
    pub fn is_transient(&self) -> bool {
        self.kind == TransportErrorKind::Transient
    }
}

/// Errors surfaced by [`Notifier::deliver`]
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The transport failed and no retry is left
    #[error("delivery failed: {0}")]
    Delivery(#[source] TransportError),
}

/// Blocking message transport (SMTP relay, chat webhook, test double)
pub trait NotificationTransport: Send + Sync {
    /// Send one notification
    fn send(&self, notification: &Notification) -> Result<(), TransportError>;
}

/// Transport that writes notifications to `tracing` instead of sending them
///
/// Used by the `logfan` binary, which has no outbound relay configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTransport;

impl NotificationTransport for TracingTransport {
    fn send(&self, notification: &Notification) -> Result<(), TransportError> {
        tracing::warn!(
            recipients = %notification.recipients.join(", "),
            subject = %notification.subject,
            body = %notification.body,
            "notification"
        );
        Ok(())
    }
}

/// Sends subjects and bodies to a fixed recipient list
///
/// A transient failure is retried exactly once after `retry_backoff`; a
/// fatal failure or a second failure is returned. A disabled notifier
/// accepts every message and sends nothing.
#[derive(Clone)]
pub struct Notifier {
    recipients: Vec<String>,
    transport: Arc<dyn NotificationTransport>,
    retry_backoff: Duration,
    disabled: bool,
}

impl Notifier {
    /// Create a notifier with the default backoff
    pub fn new(recipients: Vec<String>, transport: Arc<dyn NotificationTransport>) -> Self {
        Self {
            recipients,
            transport,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            disabled: false,
        }
    }

    /// Set the wait before the single retry
    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Turn delivery into a no-op
    #[must_use]
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Recipients every message goes to
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Check if delivery is switched off
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Deliver one message, blocking the calling thread
    pub fn deliver(
        &self,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<(), NotifyError> {
        if self.disabled {
            return Ok(());
        }

        let notification = Notification {
            recipients: self.recipients.clone(),
            subject: subject.into(),
            body: body.into(),
        };

        match self.transport.send(&notification) {
            Ok(()) => Ok(()),
            Err(e) if e.is_transient() => {
                tracing::debug!(
                    subject = %notification.subject,
                    error = %e,
                    backoff = ?self.retry_backoff,
                    "transient notification failure, retrying once"
                );
                std::thread::sleep(self.retry_backoff);
                self.transport
                    .send(&notification)
                    .map_err(NotifyError::Delivery)
            }
            Err(e) => Err(NotifyError::Delivery(e)),
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("recipients", &self.recipients)
            .field("retry_backoff", &self.retry_backoff)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

/// Subjects and bodies shared by the notifying sinks
pub(crate) mod message;

/// Transport doubles shared by sink tests
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;

    use parking_lot::Mutex;

    use super::{Notification, NotificationTransport, TransportError};

    /// Records every attempt and replays scripted failures first
    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        attempts: Mutex<Vec<Notification>>,
        delivered: Mutex<Vec<Notification>>,
        script: Mutex<VecDeque<TransportError>>,
    }

    impl RecordingTransport {
        pub(crate) fn failing_with(errors: impl IntoIterator<Item = TransportError>) -> Self {
            Self {
                script: Mutex::new(errors.into_iter().collect()),
                ..Self::default()
            }
        }

        pub(crate) fn attempts(&self) -> usize {
            self.attempts.lock().len()
        }

        pub(crate) fn delivered(&self) -> Vec<Notification> {
            self.delivered.lock().clone()
        }
    }

    impl NotificationTransport for RecordingTransport {
        fn send(&self, notification: &Notification) -> Result<(), TransportError> {
            self.attempts.lock().push(notification.clone());
            if let Some(err) = self.script.lock().pop_front() {
                return Err(err);
            }
            self.delivered.lock().push(notification.clone());
            Ok(())
        }
    }
}
