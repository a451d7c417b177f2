//! Sink Builder
//!
//! Turns the `[sinks]` section into sink instances, in name order, ready to
//! be registered with the hub.

use std::sync::Arc;

use anyhow::{Context, Result};
use logfan_config::{Config, SinkConfig};
use logfan_sinks::{
    BatchingSink, MailSink, NotificationTransport, RotatingFileSink, Sink, StreamSink,
};
use tracing::{debug, info};

/// Build every enabled sink
///
/// Mail and batching sinks send through `transport`. Must be called inside a tokio
/// runtime because batching sinks capture its handle.
pub fn build_sinks(
    config: &Config,
    transport: Arc<dyn NotificationTransport>,
) -> Result<Vec<Arc<dyn Sink>>> {
    let mut sinks: Vec<Arc<dyn Sink>> = Vec::with_capacity(config.sinks.len());

    for (name, sink_config) in config.sinks.iter() {
        if !sink_config.is_enabled() {
            debug!(sink = %name, "sink disabled, skipping");
            continue;
        }

        let sink: Arc<dyn Sink> = match sink_config {
            SinkConfig::Stream(c) => Arc::new(StreamSink::from_config(name, c)),
            SinkConfig::RotatingFile(c) => Arc::new(
                RotatingFileSink::new(name, c)
                    .with_context(|| format!("failed to build sink '{}'", name))?,
            ),
            SinkConfig::Mail(c) => {
                Arc::new(MailSink::from_config(name, c, Arc::clone(&transport)))
            }
            SinkConfig::BatchingMail(c) => Arc::new(
                BatchingSink::from_config(name, c, Arc::clone(&transport))
                    .with_context(|| format!("failed to build sink '{}'", name))?,
            ),
        };

        info!(
            sink = %name,
            r#type = sink_config.type_name(),
            min_level = %sink_config.min_level(),
            "configured sink"
        );
        sinks.push(sink);
    }

    Ok(sinks)
}
