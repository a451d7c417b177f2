//! Rate-limited fallback reporting
//!
//! Failures that happen away from any caller (summary delivery from a
//! watcher, retention sweeps, dispose) cannot be returned and must not be
//! routed back through the hub. They go to `tracing` through this logger,
//! which emits at most one record per interval per component and counts
//! what it suppressed in between.
//!
//! # Example
//!
//! ```
//! use logfan_sinks::util::RateLimitedLogger;
//! use std::time::Duration;
//!
//! let logger = RateLimitedLogger::new("trace_file", Duration::from_secs(10));
//! let err = std::io::Error::other("permission denied");
//!
//! assert!(logger.error("retention delete failed", &err));
//! assert!(!logger.error("retention delete failed", &err));
//! assert_eq!(logger.total_error_count(), 2);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default interval between emitted records
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Rate-limited logger for background failures
pub struct RateLimitedLogger {
    /// Sink name attached to every record
    component: String,

    /// Minimum interval between records
    min_interval: Duration,

    /// Last time a record was emitted
    last_log_time: Mutex<Option<Instant>>,

    /// Errors since the last emitted record
    error_count: AtomicU64,

    /// Errors ever recorded
    total_errors: AtomicU64,
}

impl RateLimitedLogger {
    /// Create a logger for `component` with the given interval
    pub fn new(component: impl Into<String>, min_interval: Duration) -> Self {
        Self {
            component: component.into(),
            min_interval,
            last_log_time: Mutex::new(None),
            error_count: AtomicU64::new(0),
            total_errors: AtomicU64::new(0),
        }
    }

    /// Create a logger with the default interval
    pub fn with_default_interval(component: impl Into<String>) -> Self {
        Self::new(component, DEFAULT_LOG_INTERVAL)
    }

    /// Record an error, emitting it if the interval has elapsed
    ///
    /// Returns true if a record was emitted.
    pub fn error(&self, message: &str, error: &dyn fmt::Display) -> bool {
        self.error_count.fetch_add(1, Ordering::Relaxed);
        let total = self.total_errors.fetch_add(1, Ordering::Relaxed) + 1;

        if !self.should_log() {
            return false;
        }

        let count = self.error_count.swap(0, Ordering::Relaxed);
        if count > 1 {
            tracing::error!(
                sink = %self.component,
                error = %error,
                suppressed_count = count - 1,
                total_errors = total,
                "{} (rate-limited)",
                message
            );
        } else {
            tracing::error!(
                sink = %self.component,
                error = %error,
                total_errors = total,
                "{}",
                message
            );
        }
        true
    }

    fn should_log(&self) -> bool {
        let mut last_time = self.last_log_time.lock();
        let now = Instant::now();

        match *last_time {
            Some(last) if now.duration_since(last) < self.min_interval => false,
            _ => {
                *last_time = Some(now);
                true
            }
        }
    }

    /// Component name records are tagged with
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Errors recorded since the last emitted record
    pub fn pending_error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Errors ever recorded
    pub fn total_error_count(&self) -> u64 {
        self.total_errors.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for RateLimitedLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitedLogger")
            .field("component", &self.component)
            .field("min_interval", &self.min_interval)
            .field("total_errors", &self.total_error_count())
            .finish()
    }
}
