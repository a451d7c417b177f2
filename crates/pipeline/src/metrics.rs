//! Hub metrics
//!
//! Atomic counters for tracking fan-out. All operations use relaxed
//! ordering; values are eventually consistent, not real-time.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by [`LogHub`](crate::LogHub)
#[derive(Debug, Default)]
pub struct HubMetrics {
    /// Events passed to `distribute`
    events_distributed: AtomicU64,

    /// Successful sink writes
    sink_writes: AtomicU64,

    /// Failed or panicked sink writes
    sink_failures: AtomicU64,

    /// Distribute calls that returned an error
    delivery_errors: AtomicU64,
}

impl HubMetrics {
    /// Create new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            events_distributed: AtomicU64::new(0),
            sink_writes: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            delivery_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record_distributed(&self) {
        self.events_distributed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_sink_write(&self) {
        self.sink_writes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_delivery_error(&self) {
        self.delivery_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time copy of all counters
    #[inline]
    pub fn snapshot(&self) -> HubMetricsSnapshot {
        HubMetricsSnapshot {
            events_distributed: self.events_distributed.load(Ordering::Relaxed),
            sink_writes: self.sink_writes.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
            delivery_errors: self.delivery_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of hub metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubMetricsSnapshot {
    pub events_distributed: u64,
    pub sink_writes: u64,
    pub sink_failures: u64,
    pub delivery_errors: u64,
}

impl HubMetricsSnapshot {
    /// Fraction of sink writes that failed, 0.0 when nothing was written
    pub fn failure_rate(&self) -> f64 {
        let total = self.sink_writes + self.sink_failures;
        if total == 0 {
            0.0
        } else {
            self.sink_failures as f64 / total as f64
        }
    }
}
