//! logfan - Pipeline
//!
//! The distribution hub that connects producers to sinks.
//!
//! # Architecture
//!
//! ```text
//! [Logger] --LogEvent--> [LogHub::distribute] --&LogEvent--> sink 1 (stream)
//!                               |                       --> sink 2 (rotating file)
//!                               |                       --> sink 3 (batching)
//!                               v
//!                  Result<(), DeliveryError>
//! ```
//!
//! # Key Design
//!
//! - **Synchronous fan-out**: `distribute` returns after every sink's `write`
//! - **Failure isolation**: errors and panics are collected, never short-circuit
//! - **Ordered registry**: registration order is fan-out order, duplicates allowed
//! - **Explicit instance**: share the hub as `Arc<LogHub>`, no global
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use logfan_pipeline::LogHub;
//! use logfan_protocol::{LogEvent, LogLevel};
//! use logfan_sinks::StreamSink;
//!
//! let hub = LogHub::new();
//! hub.register(Arc::new(StreamSink::stderr("console")));
//!
//! hub.distribute(&LogEvent::new(LogLevel::Info, "started")).unwrap();
//! ```

mod error;
mod hub;
mod logger;
mod metrics;

pub use error::{DeliveryError, SinkFailure};
pub use hub::LogHub;
pub use logger::Logger;
pub use metrics::{HubMetrics, HubMetricsSnapshot};
