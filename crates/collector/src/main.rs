//! logfan - fan log lines out to stream, rotating file and batching sinks
//!
//! # Usage
//!
//! ```bash
//! # Read stdin, one event per line (default)
//! my-app 2>&1 | logfan --config configs/logfan.toml
//! my-app 2>&1 | logfan run --source MyApp --method main --level warning
//!
//! # Validate a config and list the sinks it would build
//! logfan check --config configs/logfan.toml
//! ```

mod cmd;
mod sink_builder;

use anyhow::Result;
use clap::{Parser, Subcommand};
use logfan_config::{LogConfig, LogFormat};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

/// logfan - event fan-out to pluggable sinks
#[derive(Parser, Debug)]
#[command(name = "logfan")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file
    #[arg(short, long, default_value = "configs/logfan.toml", global = true)]
    config: std::path::PathBuf,

    /// Internal log filter, overrides `[log] level` (e.g. `debug` or `warn,logfan_sinks=trace`)
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read events from stdin and distribute them (default)
    Run(cmd::run::RunArgs),

    /// Validate the configuration and list enabled sinks
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Check) => cmd::check::run(&cli.config),
        Some(Command::Run(args)) => {
            let config = cmd::load_config(&cli.config)?;
            init_logging(&config.log, cli.log_level.as_deref())?;
            cmd::run::run(config, args).await
        }
        // No subcommand = read stdin with default arguments
        None => {
            let config = cmd::load_config(&cli.config)?;
            init_logging(&config.log, cli.log_level.as_deref())?;
            cmd::run::run(config, cmd::run::RunArgs::default()).await
        }
    }
}

/// Initialize the tracing subscriber for logfan's own diagnostics
///
/// Diagnostics always go to stderr; stdout belongs to stream sinks.
fn init_logging(config: &LogConfig, level_override: Option<&str>) -> Result<()> {
    let directive = level_override.unwrap_or(&config.level);
    let filter = EnvFilter::try_new(directive)
        .map_err(|e| anyhow::anyhow!("invalid log level '{}': {}", directive, e))?;

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Console => fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    Ok(())
}
