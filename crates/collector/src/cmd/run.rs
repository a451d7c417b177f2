//! `logfan run` - distribute stdin lines until EOF or Ctrl-C

use std::pin::pin;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use logfan_config::Config;
use logfan_pipeline::{DeliveryError, LogHub, Logger};
use logfan_protocol::{LogLevel, SourceType};
use logfan_sinks::TracingTransport;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::sink_builder::build_sinks;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Level for lines without a `level:` prefix
    #[arg(long, default_value = "info")]
    pub level: LogLevel,

    /// Source type stamped on every event
    #[arg(long)]
    pub source: Option<String>,

    /// Method stamped on every event
    #[arg(long, default_value = "stdin")]
    pub method: String,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            source: None,
            method: "stdin".into(),
        }
    }
}

/// Build the hub from `config` and feed it stdin
pub async fn run(config: Config, args: RunArgs) -> Result<()> {
    let hub = Arc::new(LogHub::new());
    for sink in build_sinks(&config, Arc::new(TracingTransport))? {
        hub.register(sink);
    }
    if hub.is_empty() {
        warn!("no sinks configured, events will be dropped");
    }
    info!(sinks = ?hub.sink_names(), "logfan started");

    let mut logger = Logger::new(Arc::clone(&hub));
    if let Some(source) = &args.source {
        logger = logger.with_source(SourceType::new(source));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shutdown = pin!(tokio::signal::ctrl_c());

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if let Err(e) = distribute_line(&logger, &line, &args) {
                    warn!(error = %e, "event not delivered everywhere");
                }
            }
            _ = &mut shutdown => {
                info!("interrupted, shutting down");
                break;
            }
        }
    }

    let metrics = hub.metrics();
    hub.dispose().await;
    info!(
        events = metrics.events_distributed,
        sink_failures = metrics.sink_failures,
        "logfan stopped"
    );
    Ok(())
}

/// Distribute one stdin line; blank lines are skipped
///
/// Sinks block on file and transport I/O (a transient failure sleeps through
/// a retry backoff), so the worker is handed off while they run.
fn distribute_line(logger: &Logger, line: &str, args: &RunArgs) -> Result<(), DeliveryError> {
    if line.trim().is_empty() {
        return Ok(());
    }
    let (level, message) = split_level(line, args.level);
    tokio::task::block_in_place(|| logger.log(level, &args.method, message))
}

/// Split an optional `level:` prefix off a line
///
/// `error: disk full` becomes `(Error, "disk full")`; anything else keeps
/// `default` and the whole line.
fn split_level(line: &str, default: LogLevel) -> (LogLevel, &str) {
    if let Some((prefix, rest)) = line.split_once(':')
        && let Ok(level) = prefix.parse::<LogLevel>()
    {
        return (level, rest.trim_start());
    }
    (default, line)
}
