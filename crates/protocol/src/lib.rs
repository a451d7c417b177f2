//! logfan Protocol - Core event types
//!
//! This crate provides the types that flow from call sites through the hub
//! into every sink:
//! - `LogLevel` - Totally ordered severity used for threshold filtering
//! - `LogEvent` - Immutable record created at the call site
//! - `SourceType` - Name of the type an event was logged on behalf of
//!
//! # Design Principles
//!
//! - **Immutable after construction**: sinks only ever see `&LogEvent`
//! - **Timestamp at creation**: the same instant drives display and batching
//! - **Cheap fan-out**: `SourceType` is an `Arc<str>`, cloning never copies

mod event;
mod level;
mod source;

pub use event::LogEvent;
pub use level::{LogLevel, ParseLevelError};
pub use source::SourceType;

/// Timestamp format used when rendering events as text lines
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

// Test modules - only compiled during testing
#[cfg(test)]
mod event_test;
