//! Tests for LogEvent

use chrono::{TimeZone, Utc};

use crate::{LogEvent, LogLevel, SourceType};

fn fixed_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 45).unwrap()
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_new_sets_defaults() {
    let event = LogEvent::new(LogLevel::Info, "started");

    assert_eq!(event.message(), "started");
    assert_eq!(event.level(), LogLevel::Info);
    assert!(event.source().is_none());
    assert_eq!(event.method(), "");
    assert_eq!(event.file_path(), "");
    assert_eq!(event.line_number(), 0);
}

#[test]
fn test_new_assigns_current_timestamp() {
    let before = Utc::now();
    let event = LogEvent::new(LogLevel::Debug, "x");
    let after = Utc::now();

    assert!(event.timestamp() >= before);
    assert!(event.timestamp() <= after);
}

#[test]
fn test_builder_chain() {
    let event = LogEvent::new(LogLevel::Error, "boom")
        .with_source(SourceType::new("Store"))
        .with_method("save")
        .with_location("src/store.rs", 17);

    assert_eq!(event.source().map(SourceType::as_str), Some("Store"));
    assert_eq!(event.method(), "save");
    assert_eq!(event.file_path(), "src/store.rs");
    assert_eq!(event.line_number(), 17);
}

#[test]
fn test_clone_keeps_timestamp() {
    let event = LogEvent::new(LogLevel::Warning, "slow");
    let copy = event.clone();
    assert_eq!(event.timestamp(), copy.timestamp());
    assert_eq!(event, copy);
}

// =============================================================================
// Grouping key
// =============================================================================

#[test]
fn test_grouping_key_with_source() {
    let event = LogEvent::new(LogLevel::Error, "x")
        .with_source(SourceType::new("Mailer"))
        .with_method("send");
    assert_eq!(event.grouping_key(), "Mailer.send");
}

#[test]
fn test_grouping_key_without_source() {
    let event = LogEvent::new(LogLevel::Error, "x").with_method("send");
    assert_eq!(event.grouping_key(), "send");
}

#[test]
fn test_grouping_key_ignores_message() {
    let a = LogEvent::new(LogLevel::Error, "first").with_method("run");
    let b = LogEvent::new(LogLevel::Error, "second").with_method("run");
    assert_eq!(a.grouping_key(), b.grouping_key());
}

// =============================================================================
// Display
// =============================================================================

#[test]
fn test_display_full() {
    let event = LogEvent::new(LogLevel::Error, "connection refused")
        .with_source(SourceType::new("MailClient"))
        .with_method("connect")
        .with_timestamp(fixed_time());

    assert_eq!(
        event.to_string(),
        "[2025-01-15T10:30:45.000Z] [ERROR] MailClient.connect: connection refused"
    );
}

#[test]
fn test_display_method_only() {
    let event = LogEvent::new(LogLevel::Info, "ready")
        .with_method("main")
        .with_timestamp(fixed_time());

    assert_eq!(event.to_string(), "[2025-01-15T10:30:45.000Z] [INFO] main: ready");
}

#[test]
fn test_display_source_only() {
    let event = LogEvent::new(LogLevel::Debug, "tick")
        .with_source(SourceType::new("Clock"))
        .with_timestamp(fixed_time());

    assert_eq!(event.to_string(), "[2025-01-15T10:30:45.000Z] [DEBUG] Clock: tick");
}

#[test]
fn test_display_bare_message() {
    let event = LogEvent::new(LogLevel::Warning, "disk almost full").with_timestamp(fixed_time());

    assert_eq!(
        event.to_string(),
        "[2025-01-15T10:30:45.000Z] [WARNING] disk almost full"
    );
}
