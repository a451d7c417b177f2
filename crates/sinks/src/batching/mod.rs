//! Batching Sink - debounced notifications per recurring condition
//!
//! The first qualifying event for a grouping key (`Source.method`) is sent
//! right away. Everything that follows for the same key is pooled; each
//! pooled event pushes the key's deadline out. Once a key has been quiet
//! until its deadline, its watcher removes the batch and sends one summary
//! if more than the first event arrived.
//!
//! ```text
//! t=0   write(A)  -> notify "[ERROR]" now, deadline = 0 + initial_window
//! t=5   write(A)  -> pooled,               deadline = 5 + increment_window
//! t=65  watcher   -> deadline reached, summary "Count: 2", batch removed
//! t=70  write(A)  -> new batch, notify now again
//! ```
//!
//! # Watchers
//!
//! One tokio task per active key, spawned on the runtime handle captured at
//! construction and tracked by a `TaskTracker`. `dispose` cancels all
//! watchers; a cancelled watcher drains its batch immediately so pending
//! summaries are not lost at shutdown.
//!
//! # Locking
//!
//! One mutex guards the whole key map. Writes for unrelated keys contend on
//! it; nothing slow (delivery, sleeping) ever happens while it is held.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use logfan_config::BatchingMailSinkConfig;
use logfan_protocol::{LogEvent, LogLevel};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::notify::{NotificationTransport, Notifier, message};
use crate::util::RateLimitedLogger;
use crate::{Sink, SinkError};

/// Timing and filtering for a batching sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    /// Events below this level are ignored
    pub min_level: LogLevel,
    /// Quiet period after the first event of a key
    pub initial_window: Duration,
    /// Deadline extension applied by every later event
    pub increment_window: Duration,
    /// Messages listed verbatim in a summary
    pub max_listed_messages: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Error,
            initial_window: Duration::from_secs(30),
            increment_window: Duration::from_secs(60),
            max_listed_messages: 10,
        }
    }
}

impl From<&BatchingMailSinkConfig> for BatchSettings {
    fn from(config: &BatchingMailSinkConfig) -> Self {
        Self {
            min_level: config.min_level,
            initial_window: config.initial_window(),
            increment_window: config.increment_window(),
            max_listed_messages: config.max_listed_messages,
        }
    }
}

/// `now + window`, saturating at a point no watcher will live to see
fn deadline_after(now: Instant, window: Duration) -> Instant {
    now.checked_add(window)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Roughly thirty years, the horizon tokio itself uses for "never"
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Events pooled for one key
struct PendingBatch {
    events: Vec<LogEvent>,
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    deadline: Instant,
}

impl PendingBatch {
    fn new(event: LogEvent, deadline: Instant) -> Self {
        Self {
            first_seen: event.timestamp(),
            last_seen: event.timestamp(),
            events: vec![event],
            deadline,
        }
    }

    fn pool(&mut self, event: LogEvent, deadline: Instant) {
        self.last_seen = event.timestamp();
        self.deadline = self.deadline.max(deadline);
        self.events.push(event);
    }

    fn count(&self) -> usize {
        self.events.len()
    }
}

/// Key map plus the closed flag, under one lock
#[derive(Default)]
struct BatchState {
    batches: HashMap<String, PendingBatch>,
    closed: bool,
}

struct Inner {
    name: String,
    settings: BatchSettings,
    notifier: Notifier,
    state: Mutex<BatchState>,
    handle: Handle,
    tracker: TaskTracker,
    cancel: CancellationToken,
    fallback: RateLimitedLogger,
}

/// Debouncing notification sink
pub struct BatchingSink {
    inner: Arc<Inner>,
}

impl BatchingSink {
    /// Create a sink whose watchers run on the current tokio runtime
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Init` when called outside a tokio runtime.
    pub fn new(
        name: impl Into<String>,
        settings: BatchSettings,
        notifier: Notifier,
    ) -> Result<Self, SinkError> {
        let handle = Handle::try_current()
            .map_err(|e| SinkError::init(format!("batching sink needs a tokio runtime: {}", e)))?;
        Self::with_handle(name, settings, notifier, handle)
    }

    /// Create a sink whose watchers run on `handle`
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Config` for zero windows or a zero message cap.
    pub fn with_handle(
        name: impl Into<String>,
        settings: BatchSettings,
        notifier: Notifier,
        handle: Handle,
    ) -> Result<Self, SinkError> {
        if settings.initial_window.is_zero() || settings.increment_window.is_zero() {
            return Err(SinkError::config("batching windows must be greater than zero"));
        }
        if settings.max_listed_messages == 0 {
            return Err(SinkError::config("max_listed_messages must be greater than zero"));
        }

        let name = name.into();
        Ok(Self {
            inner: Arc::new(Inner {
                fallback: RateLimitedLogger::with_default_interval(name.clone()),
                name,
                settings,
                notifier,
                state: Mutex::new(BatchState::default()),
                handle,
                tracker: TaskTracker::new(),
                cancel: CancellationToken::new(),
            }),
        })
    }

    /// Build from configuration, sending through `transport`
    pub fn from_config(
        name: impl Into<String>,
        config: &BatchingMailSinkConfig,
        transport: Arc<dyn NotificationTransport>,
    ) -> Result<Self, SinkError> {
        let notifier = Notifier::new(config.recipients.clone(), transport)
            .with_retry_backoff(config.retry_backoff)
            .with_disabled(config.disabled);
        Self::new(name, BatchSettings::from(config), notifier)
    }

    /// Timing and filtering in effect
    pub fn settings(&self) -> &BatchSettings {
        &self.inner.settings
    }

    /// Keys with an active batch, sorted
    pub fn pending_keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.inner.state.lock().batches.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of events pooled for `key`, including the first
    pub fn pending_count(&self, key: &str) -> Option<usize> {
        self.inner.state.lock().batches.get(key).map(PendingBatch::count)
    }

    /// Number of live watcher tasks
    pub fn watcher_count(&self) -> usize {
        self.inner.tracker.len()
    }
}

impl Inner {
    /// Wait for `key`'s deadline, then drain it
    async fn watch(self: Arc<Self>, key: String) {
        loop {
            let deadline = match self.state.lock().batches.get(&key) {
                Some(batch) => batch.deadline,
                None => return,
            };

            let cancelled = tokio::select! {
                _ = tokio::time::sleep_until(deadline) => false,
                _ = self.cancel.cancelled() => true,
            };

            let drained = {
                let mut state = self.state.lock();
                let due = match state.batches.get(&key) {
                    Some(batch) => cancelled || Instant::now() >= batch.deadline,
                    None => return,
                };
                if due { state.batches.remove(&key) } else { None }
            };

            if let Some(batch) = drained {
                self.send_summary(&key, batch).await;
                return;
            }
        }
    }

    async fn send_summary(&self, key: &str, batch: PendingBatch) {
        if batch.count() <= 1 {
            tracing::trace!(sink = %self.name, key = %key, "batch expired without repeats");
            return;
        }

        let Some(first) = batch.events.first() else {
            return;
        };
        let subject = message::subject(first);
        let body = message::summary_body(
            &batch.events,
            batch.first_seen,
            batch.last_seen,
            self.settings.max_listed_messages,
        );

        tracing::debug!(sink = %self.name, key = %key, count = batch.count(), "sending summary");

        let notifier = self.notifier.clone();
        match tokio::task::spawn_blocking(move || notifier.deliver(subject, body)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.fallback.error("summary delivery failed", &e);
            }
            Err(e) => {
                self.fallback.error("summary delivery task failed", &e);
            }
        }
    }
}

#[async_trait]
impl Sink for BatchingSink {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn write(&self, event: &LogEvent) -> Result<(), SinkError> {
        let inner = &self.inner;
        if !event.level().passes(inner.settings.min_level) {
            return Ok(());
        }

        let key = event.grouping_key();
        let now = Instant::now();
        {
            let mut state = inner.state.lock();
            if state.closed {
                return Err(SinkError::Closed);
            }

            if let Some(batch) = state.batches.get_mut(&key) {
                let deadline = deadline_after(now, inner.settings.increment_window);
                batch.pool(event.clone(), deadline);
                return Ok(());
            }

            let deadline = deadline_after(now, inner.settings.initial_window);
            state
                .batches
                .insert(key.clone(), PendingBatch::new(event.clone(), deadline));
            inner
                .tracker
                .spawn_on(Arc::clone(inner).watch(key), &inner.handle);
        }

        inner
            .notifier
            .deliver(message::subject(event), message::single_event_body(event))?;
        Ok(())
    }

    async fn dispose(&self) -> Result<(), SinkError> {
        let inner = &self.inner;
        inner.state.lock().closed = true;

        inner.cancel.cancel();
        inner.tracker.close();
        inner.tracker.wait().await;

        let leftover = std::mem::take(&mut inner.state.lock().batches);
        if !leftover.is_empty() {
            tracing::warn!(
                sink = %inner.name,
                keys = leftover.len(),
                "batches left without a watcher at dispose"
            );
        }
        Ok(())
    }
}

impl fmt::Debug for BatchingSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchingSink")
            .field("name", &self.inner.name)
            .field("settings", &self.inner.settings)
            .field("notifier", &self.inner.notifier)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "batching_test.rs"]
mod batching_test;
