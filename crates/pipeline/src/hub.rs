//! Distribution hub
//!
//! Owns the ordered sink registry and fans each event out to every sink.
//! A failing or panicking sink never stops the others; failures are
//! collected in registration order and returned together.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use logfan_protocol::LogEvent;
use logfan_sinks::{Sink, SinkError};
use parking_lot::RwLock;

use crate::error::{DeliveryError, SinkFailure};
use crate::metrics::{HubMetrics, HubMetricsSnapshot};

/// Synchronous multi-sink fan-out
///
/// The registry is a plain `Vec`: insertion order is fan-out order, and
/// registering the same sink twice delivers to it twice.
///
/// `distribute` iterates a snapshot taken under the read lock, so sinks
/// registered or removed concurrently take effect from the next call.
#[derive(Default)]
pub struct LogHub {
    sinks: RwLock<Vec<Arc<dyn Sink>>>,
    metrics: HubMetrics,
}

impl LogHub {
    /// Create an empty hub
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sink to the registry
    pub fn register(&self, sink: Arc<dyn Sink>) {
        tracing::debug!(sink = %sink.name(), "sink registered");
        self.sinks.write().push(sink);
    }

    /// Remove the first registration of `sink`
    ///
    /// Returns false if it was not registered.
    pub fn unregister(&self, sink: &Arc<dyn Sink>) -> bool {
        let mut sinks = self.sinks.write();
        match sinks.iter().position(|s| Arc::ptr_eq(s, sink)) {
            Some(index) => {
                let removed = sinks.remove(index);
                tracing::debug!(sink = %removed.name(), "sink unregistered");
                true
            }
            None => false,
        }
    }

    /// Write `event` to every registered sink
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] listing every sink that failed, after all
    /// sinks have been attempted.
    pub fn distribute(&self, event: &LogEvent) -> Result<(), DeliveryError> {
        self.metrics.record_distributed();
        let sinks = self.sinks.read().clone();

        let mut failures = Vec::new();
        for sink in &sinks {
            let result = panic::catch_unwind(AssertUnwindSafe(|| sink.write(event)))
                .unwrap_or_else(|payload| Err(SinkError::Panicked(panic_message(payload.as_ref()))));

            match result {
                Ok(()) => self.metrics.record_sink_write(),
                Err(error) => {
                    self.metrics.record_sink_failure();
                    failures.push(SinkFailure {
                        sink: sink.name().to_string(),
                        error,
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            self.metrics.record_delivery_error();
            Err(DeliveryError::new(failures))
        }
    }

    /// Empty the registry and dispose every sink
    ///
    /// Dispose failures are logged and otherwise ignored, so every sink
    /// gets its turn.
    pub async fn dispose(&self) {
        let sinks = std::mem::take(&mut *self.sinks.write());

        for sink in sinks {
            match sink.dispose().await {
                Ok(()) => tracing::debug!(sink = %sink.name(), "sink disposed"),
                Err(e) => tracing::error!(sink = %sink.name(), error = %e, "sink dispose failed"),
            }
        }
    }

    /// Number of registrations
    pub fn len(&self) -> usize {
        self.sinks.read().len()
    }

    /// Check if no sink is registered
    pub fn is_empty(&self) -> bool {
        self.sinks.read().is_empty()
    }

    /// Registered sink names in fan-out order
    pub fn sink_names(&self) -> Vec<String> {
        self.sinks
            .read()
            .iter()
            .map(|s| s.name().to_string())
            .collect()
    }

    /// Current counters
    pub fn metrics(&self) -> HubMetricsSnapshot {
        self.metrics.snapshot()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl fmt::Debug for LogHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogHub")
            .field("sinks", &self.sink_names())
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}
