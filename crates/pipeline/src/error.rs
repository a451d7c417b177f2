//! Hub error types

use std::fmt;

use logfan_sinks::SinkError;
use thiserror::Error;

/// One sink's failure during a distribute call
#[derive(Debug, Error)]
#[error("{sink}: {error}")]
pub struct SinkFailure {
    /// Name of the failing sink
    pub sink: String,
    /// What went wrong
    #[source]
    pub error: SinkError,
}

/// Every sink failure of one distribute call, in registration order
///
/// Sinks after a failing one were still written to; this only reports.
#[derive(Debug)]
pub struct DeliveryError {
    failures: Vec<SinkFailure>,
}

impl DeliveryError {
    pub(crate) fn new(failures: Vec<SinkFailure>) -> Self {
        Self { failures }
    }

    /// Individual failures in registration order
    pub fn failures(&self) -> &[SinkFailure] {
        &self.failures
    }

    /// Take ownership of the failures
    pub fn into_failures(self) -> Vec<SinkFailure> {
        self.failures
    }

    /// Number of sinks that failed
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Always false for errors returned by the hub
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sink(s) failed", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            f.write_str(if i == 0 { ": " } else { "; " })?;
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for DeliveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .first()
            .map(|f| f as &(dyn std::error::Error + 'static))
    }
}
