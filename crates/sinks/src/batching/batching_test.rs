//! Tests for the batching sink
//!
//! All async tests run on a paused clock: sleeping advances virtual time to
//! the next timer, so watchers fire deterministically.

use std::sync::Arc;
use std::time::Duration;

use logfan_config::BatchingMailSinkConfig;
use logfan_protocol::{LogEvent, LogLevel, SourceType};

use super::*;
use crate::notify::TransportError;
use crate::notify::testing::RecordingTransport;

fn event(level: LogLevel, method: &str, message: &str) -> LogEvent {
    LogEvent::new(level, message)
        .with_source(SourceType::new("MailClient"))
        .with_method(method)
}

fn error(method: &str, message: &str) -> LogEvent {
    event(LogLevel::Error, method, message)
}

fn notifier(transport: &Arc<RecordingTransport>) -> Notifier {
    Notifier::new(vec!["ops@example.com".into()], transport.clone())
        .with_retry_backoff(Duration::ZERO)
}

fn sink_with(transport: &Arc<RecordingTransport>, settings: BatchSettings) -> BatchingSink {
    BatchingSink::new("alerts", settings, notifier(transport)).unwrap()
}

fn sink(transport: &Arc<RecordingTransport>) -> BatchingSink {
    sink_with(transport, BatchSettings::default())
}

async fn advance(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

// =============================================================================
// Filtering and first notification
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_below_min_level_ignored() {
    let transport = Arc::new(RecordingTransport::default());
    let sink = sink(&transport);

    sink.write(&event(LogLevel::Warning, "connect", "slow")).unwrap();
    sink.write(&event(LogLevel::Info, "connect", "retrying")).unwrap();

    assert_eq!(transport.attempts(), 0);
    assert!(sink.pending_keys().is_empty());
    assert_eq!(sink.watcher_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_first_event_notifies_immediately() {
    let transport = Arc::new(RecordingTransport::default());
    let sink = sink(&transport);

    sink.write(&error("connect", "connection refused")).unwrap();

    let sent = transport.delivered();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "[ERROR]");
    assert!(sent[0].body.contains("Message: connection refused"));
    assert_eq!(sink.pending_keys(), vec!["MailClient.connect".to_string()]);
    assert_eq!(sink.pending_count("MailClient.connect"), Some(1));
    assert_eq!(sink.watcher_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_repeats_are_pooled_not_sent() {
    let transport = Arc::new(RecordingTransport::default());
    let sink = sink(&transport);

    for _ in 0..5 {
        sink.write(&error("connect", "connection refused")).unwrap();
    }

    assert_eq!(transport.delivered().len(), 1);
    assert_eq!(sink.pending_count("MailClient.connect"), Some(5));
    assert_eq!(sink.watcher_count(), 1);
}

// =============================================================================
// Draining
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_single_event_expires_silently() {
    let transport = Arc::new(RecordingTransport::default());
    let sink = sink(&transport);

    sink.write(&error("connect", "connection refused")).unwrap();
    advance(31).await;

    assert!(sink.pending_keys().is_empty());
    sink.dispose().await.unwrap();
    assert_eq!(transport.delivered().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_repeats_produce_one_summary() {
    let transport = Arc::new(RecordingTransport::default());
    let sink = sink(&transport);

    sink.write(&error("connect", "refused 1")).unwrap();
    sink.write(&error("connect", "refused 2")).unwrap();
    sink.write(&error("connect", "refused 3")).unwrap();

    // Pooling moved the deadline to t=60
    advance(31).await;
    assert_eq!(sink.pending_count("MailClient.connect"), Some(3));

    advance(30).await;
    assert!(sink.pending_keys().is_empty());
    sink.dispose().await.unwrap();

    let sent = transport.delivered();
    assert_eq!(sent.len(), 2);
    let summary = &sent[1];
    assert_eq!(summary.subject, "[ERROR]");
    assert!(summary.body.contains("Count: 3\n"));
    assert!(summary.body.contains("Message0: refused 1\n"));
    assert!(summary.body.contains("Message2: refused 3\n"));
    assert!(summary.body.contains("Method: connect\n"));
}

#[tokio::test(start_paused = true)]
async fn test_each_repeat_slides_deadline() {
    let transport = Arc::new(RecordingTransport::default());
    let sink = sink(&transport);

    sink.write(&error("connect", "refused")).unwrap();
    advance(20).await;
    sink.write(&error("connect", "refused")).unwrap(); // deadline now t=80

    advance(40).await; // t=60
    assert_eq!(sink.pending_count("MailClient.connect"), Some(2));

    advance(30).await; // t=90
    assert!(sink.pending_keys().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_deadline_never_moves_earlier() {
    let transport = Arc::new(RecordingTransport::default());
    let settings = BatchSettings {
        initial_window: Duration::from_secs(30),
        increment_window: Duration::from_secs(10),
        ..Default::default()
    };
    let sink = sink_with(&transport, settings);

    sink.write(&error("connect", "refused")).unwrap();
    advance(5).await;
    sink.write(&error("connect", "refused")).unwrap(); // 5 + 10 < 30

    advance(15).await; // t=20
    assert_eq!(sink.pending_count("MailClient.connect"), Some(2));

    advance(11).await; // t=31
    assert!(sink.pending_keys().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_summary_caps_listed_messages() {
    let transport = Arc::new(RecordingTransport::default());
    let settings = BatchSettings {
        max_listed_messages: 2,
        ..Default::default()
    };
    let sink = sink_with(&transport, settings);

    for i in 0..4 {
        sink.write(&error("connect", &format!("refused {i}"))).unwrap();
    }
    advance(61).await;
    sink.dispose().await.unwrap();

    let summary = &transport.delivered()[1];
    assert!(summary.body.contains("Count: 4\n"));
    assert!(summary.body.contains("Message1: refused 1\n"));
    assert!(!summary.body.contains("Message2:"));
}

// =============================================================================
// Keys
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_keys_are_independent() {
    let transport = Arc::new(RecordingTransport::default());
    let sink = sink(&transport);

    sink.write(&error("connect", "refused")).unwrap();
    sink.write(&error("send", "timeout")).unwrap();
    sink.write(&error("send", "timeout")).unwrap();

    assert_eq!(transport.delivered().len(), 2);
    assert_eq!(
        sink.pending_keys(),
        vec!["MailClient.connect".to_string(), "MailClient.send".to_string()]
    );
    assert_eq!(sink.watcher_count(), 2);

    // connect expires alone at t=30; send was extended to t=60
    advance(31).await;
    assert_eq!(sink.pending_keys(), vec!["MailClient.send".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_key_after_drain_starts_over() {
    let transport = Arc::new(RecordingTransport::default());
    let sink = sink(&transport);

    sink.write(&error("connect", "refused")).unwrap();
    advance(31).await;
    assert!(sink.pending_keys().is_empty());

    sink.write(&error("connect", "refused again")).unwrap();
    assert_eq!(transport.delivered().len(), 2);
    assert_eq!(sink.pending_count("MailClient.connect"), Some(1));
    assert_eq!(sink.watcher_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_huge_windows_saturate_instead_of_overflowing() {
    let transport = Arc::new(RecordingTransport::default());
    let sink = sink_with(
        &transport,
        BatchSettings {
            initial_window: Duration::from_secs(u64::MAX),
            increment_window: Duration::from_secs(i64::MAX as u64),
            ..Default::default()
        },
    );

    sink.write(&error("connect", "refused")).unwrap();
    sink.write(&error("connect", "refused")).unwrap();
    sink.write(&error("connect", "refused")).unwrap();
    assert_eq!(sink.pending_count("MailClient.connect"), Some(3));

    advance(86_400).await;
    assert_eq!(sink.pending_count("MailClient.connect"), Some(3));

    sink.dispose().await.unwrap();
    let sent = transport.delivered();
    assert_eq!(sent.len(), 2);
    assert!(sent[1].body.contains("Count: 3\n"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_writers_share_one_watcher() {
    const WRITERS: usize = 8;
    const PER_WRITER: usize = 50;

    let transport = Arc::new(RecordingTransport::default());
    let sink = sink(&transport);
    let barrier = std::sync::Barrier::new(WRITERS);

    std::thread::scope(|scope| {
        for _ in 0..WRITERS {
            scope.spawn(|| {
                barrier.wait();
                for _ in 0..PER_WRITER {
                    sink.write(&error("connect", "refused")).unwrap();
                }
            });
        }
    });

    assert_eq!(sink.watcher_count(), 1);
    assert_eq!(transport.delivered().len(), 1);
    assert_eq!(
        sink.pending_count("MailClient.connect"),
        Some(WRITERS * PER_WRITER)
    );

    sink.dispose().await.unwrap();
    assert_eq!(transport.delivered().len(), 2);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_immediate_failure_propagates() {
    let transport = Arc::new(RecordingTransport::failing_with([TransportError::fatal(
        "relay refused",
    )]));
    let sink = sink(&transport);

    let err = sink.write(&error("connect", "refused")).unwrap_err();
    assert!(matches!(err, SinkError::Notify(_)));

    // The batch stays, so repeats are still pooled
    sink.write(&error("connect", "refused")).unwrap();
    assert_eq!(sink.pending_count("MailClient.connect"), Some(2));
}

#[tokio::test(start_paused = true)]
async fn test_summary_failure_is_not_surfaced() {
    let transport = Arc::new(RecordingTransport::failing_with([
        TransportError::fatal("relay refused"),
        TransportError::fatal("relay still refusing"),
    ]));
    let sink = sink(&transport);

    assert!(sink.write(&error("connect", "refused")).is_err());
    sink.write(&error("connect", "refused")).unwrap();

    advance(61).await;
    sink.dispose().await.unwrap();

    assert_eq!(transport.attempts(), 2);
    assert!(transport.delivered().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_disabled_notifier_sends_nothing() {
    let transport = Arc::new(RecordingTransport::default());
    let sink = BatchingSink::new(
        "alerts",
        BatchSettings::default(),
        notifier(&transport).with_disabled(true),
    )
    .unwrap();

    sink.write(&error("connect", "refused")).unwrap();
    sink.write(&error("connect", "refused")).unwrap();
    advance(61).await;
    sink.dispose().await.unwrap();

    assert_eq!(transport.attempts(), 0);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_dispose_flushes_pending_summaries() {
    let transport = Arc::new(RecordingTransport::default());
    let sink = sink(&transport);

    sink.write(&error("connect", "refused 1")).unwrap();
    sink.write(&error("connect", "refused 2")).unwrap();
    sink.write(&error("send", "timeout")).unwrap();

    sink.dispose().await.unwrap();

    let sent = transport.delivered();
    assert_eq!(sent.len(), 3);
    assert!(sent[2].body.contains("Count: 2\n"));
    assert!(sink.pending_keys().is_empty());
    assert_eq!(sink.watcher_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_write_after_dispose_fails() {
    let transport = Arc::new(RecordingTransport::default());
    let sink = sink(&transport);
    sink.dispose().await.unwrap();

    let err = sink.write(&error("connect", "refused")).unwrap_err();
    assert!(matches!(err, SinkError::Closed));
    assert_eq!(transport.attempts(), 0);
}

#[test]
fn test_new_outside_runtime_fails() {
    let transport = Arc::new(RecordingTransport::default());
    let err = BatchingSink::new("alerts", BatchSettings::default(), notifier(&transport))
        .unwrap_err();
    assert!(matches!(err, SinkError::Init(_)));
}

#[test]
fn test_with_handle_rejects_zero_window() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let transport = Arc::new(RecordingTransport::default());
    let settings = BatchSettings {
        initial_window: Duration::ZERO,
        ..Default::default()
    };

    let err = BatchingSink::with_handle(
        "alerts",
        settings,
        notifier(&transport),
        runtime.handle().clone(),
    )
    .unwrap_err();
    assert!(matches!(err, SinkError::Config(_)));
}

#[tokio::test]
async fn test_from_config() {
    let config = BatchingMailSinkConfig {
        recipients: vec!["ops@example.com".into()],
        min_level: LogLevel::Warning,
        initial_window_seconds: 5,
        increment_window_seconds: 7,
        max_listed_messages: 3,
        ..Default::default()
    };
    let transport: Arc<dyn NotificationTransport> = Arc::new(RecordingTransport::default());

    let sink = BatchingSink::from_config("alerts", &config, transport).unwrap();
    assert_eq!(sink.name(), "alerts");
    assert_eq!(
        *sink.settings(),
        BatchSettings {
            min_level: LogLevel::Warning,
            initial_window: Duration::from_secs(5),
            increment_window: Duration::from_secs(7),
            max_listed_messages: 3,
        }
    );
}
