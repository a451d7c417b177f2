//! Tests for the mail sink

use std::sync::Arc;
use std::time::Duration;

use logfan_config::MailSinkConfig;
use logfan_protocol::{LogEvent, LogLevel, SourceType};

use super::*;
use crate::notify::TransportError;
use crate::notify::testing::RecordingTransport;

fn event(level: LogLevel, message: &str) -> LogEvent {
    LogEvent::new(level, message)
        .with_source(SourceType::new("PaymentGateway"))
        .with_method("capture")
}

fn sink(transport: &Arc<RecordingTransport>) -> MailSink {
    let notifier = Notifier::new(vec!["oncall@example.com".into()], transport.clone())
        .with_retry_backoff(Duration::ZERO);
    MailSink::new("pager", LogLevel::Error, notifier)
}

#[test]
fn test_every_qualifying_event_is_sent() {
    let transport = Arc::new(RecordingTransport::default());
    let sink = sink(&transport);

    sink.write(&event(LogLevel::Error, "card declined")).unwrap();
    sink.write(&event(LogLevel::Error, "card declined")).unwrap();

    let sent = transport.delivered();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].recipients, vec!["oncall@example.com".to_string()]);
    assert_eq!(sent[0].subject, "[ERROR]");
    assert!(sent[0].body.starts_with("Event Details\n\n"));
    assert!(sent[0].body.contains("Class: PaymentGateway\n"));
    assert!(sent[0].body.contains("Method: capture\n"));
    assert!(sent[0].body.ends_with("Message: card declined\n"));
}

#[test]
fn test_below_min_level_ignored() {
    let transport = Arc::new(RecordingTransport::default());
    let sink = sink(&transport);

    sink.write(&event(LogLevel::Warning, "slow response")).unwrap();
    sink.write(&event(LogLevel::Info, "captured")).unwrap();

    assert_eq!(transport.attempts(), 0);
}

#[test]
fn test_delivery_failure_propagates() {
    let transport = Arc::new(RecordingTransport::failing_with([TransportError::fatal(
        "mailbox unavailable",
    )]));
    let sink = sink(&transport);

    let err = sink.write(&event(LogLevel::Error, "card declined")).unwrap_err();
    assert!(matches!(err, SinkError::Notify(_)));

    // No pooling, so the next event is tried on its own
    sink.write(&event(LogLevel::Error, "card declined")).unwrap();
    assert_eq!(transport.attempts(), 2);
    assert_eq!(transport.delivered().len(), 1);
}

#[test]
fn test_from_config() {
    let config = MailSinkConfig {
        recipients: vec!["oncall@example.com".into()],
        min_level: LogLevel::Warning,
        disabled: true,
        ..Default::default()
    };
    let recording = Arc::new(RecordingTransport::default());
    let transport: Arc<dyn NotificationTransport> = recording.clone();

    let sink = MailSink::from_config("pager", &config, transport);
    assert_eq!(sink.name(), "pager");
    assert_eq!(sink.min_level(), LogLevel::Warning);

    sink.write(&event(LogLevel::Error, "card declined")).unwrap();
    assert_eq!(recording.attempts(), 0);
}
