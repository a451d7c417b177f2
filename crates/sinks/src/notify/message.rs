//! Notification subjects and bodies
//!
//! ```text
//! Event Details
//!
//! Time: 2025-01-15T10:30:45.123Z to 2025-01-15T10:31:52.004Z
//! Level: ERROR
//! Class: MailClient
//! Method: connect
//! Count: 14
//!
//! Message0: connection refused
//!
//! Message1: connection refused
//! ```

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use logfan_protocol::{LogEvent, TIMESTAMP_FORMAT};

fn timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn class(event: &LogEvent) -> &str {
    event.source().map_or("", |s| s.as_str())
}

/// Subject shared by both message kinds
pub fn subject(event: &LogEvent) -> String {
    format!("[{}]", event.level())
}

/// Body describing one event, sent by the mail sink and for a batch's first event
pub fn single_event_body(event: &LogEvent) -> String {
    let mut body = String::from("Event Details\n\n");
    let _ = writeln!(body, "Time: {}", timestamp(event.timestamp()));
    let _ = writeln!(body, "Level: {}", event.level());
    let _ = writeln!(body, "Class: {}", class(event));
    let _ = writeln!(body, "Method: {}\n", event.method());
    let _ = writeln!(body, "Message: {}", event.message());
    body
}

/// Body summarizing a drained batch
///
/// Level, class and method come from the first event. Only the first
/// `max_listed` messages are listed.
pub fn summary_body(
    events: &[LogEvent],
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    max_listed: usize,
) -> String {
    let mut body = String::from("Event Details\n\n");
    let _ = writeln!(
        body,
        "Time: {} to {}",
        timestamp(first_seen),
        timestamp(last_seen)
    );
    if let Some(first) = events.first() {
        let _ = writeln!(body, "Level: {}", first.level());
        let _ = writeln!(body, "Class: {}", class(first));
        let _ = writeln!(body, "Method: {}", first.method());
    }
    let _ = writeln!(body, "Count: {}\n", events.len());

    for (i, event) in events.iter().take(max_listed).enumerate() {
        let _ = writeln!(body, "Message{}: {}\n", i, event.message());
    }
    body
}
