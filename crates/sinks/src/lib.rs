//! logfan - Sinks
//!
//! Destinations the hub fans events out to. Every sink implements [`Sink`]:
//! `write` is synchronous and called once per event, `dispose` is async and
//! releases files and background tasks.
//!
//! # Architecture
//!
//! ```text
//! [LogHub] --&LogEvent--> [Sink::write] --> [Destination]
//!                              |
//!                              +--(batching)--> [watcher task] --> [Notifier]
//! ```
//!
//! # Available Sinks
//!
//! | Sink | Purpose | Deferred work |
//! |------|---------|---------------|
//! | `stream` | One line per event on stdout/stderr/any writer | No |
//! | `rotating` | Size-rotated numbered files with retention | No |
//! | `mail` | One notification per qualifying event | No |
//! | `batching` | Debounced notifications per recurring condition | Watcher per key |
//!
//! # Example
//!
//! ```
//! use logfan_protocol::{LogEvent, LogLevel};
//! use logfan_sinks::{Sink, stream::StreamSink};
//!
//! let sink = StreamSink::stderr("console").with_min_level(LogLevel::Info);
//! sink.write(&LogEvent::new(LogLevel::Warning, "disk almost full")).unwrap();
//! ```

// =============================================================================
// Sink implementations (each in its own submodule)
// =============================================================================

/// Stream sink - one line per event to stdout, stderr or any writer
pub mod stream;

/// Rotating file sink - size rotation, restart recovery, retention sweep
pub mod rotating;

/// Mail sink - one notification per qualifying event
pub mod mail;

/// Batching sink - immediate first notification, debounced summaries
pub mod batching;

// =============================================================================
// Shared pieces
// =============================================================================

/// Notification transport and retrying notifier
pub mod notify;

/// Rate-limited fallback reporting for background failures
pub mod util;

/// Sink trait and errors
mod common;

// =============================================================================
// Public re-exports
// =============================================================================

pub use common::{Sink, SinkError};

pub use batching::{BatchSettings, BatchingSink};
pub use notify::{
    Notification, NotificationTransport, Notifier, NotifyError, TracingTransport, TransportError,
    TransportErrorKind,
};
pub use mail::MailSink;
pub use rotating::RotatingFileSink;
pub use stream::StreamSink;
