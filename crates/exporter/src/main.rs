//! Exporter - operator CLI for the record export pipeline
//!
//! # Usage
//!
//! ```bash
//! # Validate a configuration and every configured sink
//! exporter check configs/exporter.toml
//!
//! # Inspect stored sink positions
//! exporter positions --config configs/exporter.toml
//! exporter positions --path data/positions.db --json
//!
//! # Run a director over a synthetic in-memory log
//! exporter simulate --config configs/exporter.toml --records 100
//! ```

mod cmd;

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use exporter_config::{Config, LogConfig, LogFormat, LogLevel, LogOutput};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

/// Exporter - operator CLI for the record export pipeline
#[derive(Parser, Debug)]
#[command(name = "exporter")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a configuration file and configure every sink once
    Check(cmd::check::CheckArgs),

    /// Print the stored position of every sink
    Positions(cmd::positions::PositionsArgs),

    /// Export synthetic records through a real director
    Simulate(cmd::simulate::SimulateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Check(args) => {
            // Check doesn't need logging - just outputs to stdout
            cmd::check::run(args)
        }
        Command::Positions(args) => {
            // Positions doesn't need logging - just outputs to stdout
            cmd::positions::run(args)
        }
        Command::Simulate(args) => {
            let config = load_config(args.config.as_deref())?;
            init_logging(&config.log, cli.log_level.as_deref())?;
            cmd::simulate::run(args, config).await
        }
    }
}

/// Load a configuration file, or defaults when no path is given
pub(crate) fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            Config::from_file(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))
        }
        None => Ok(Config::default()),
    }
}

/// Initialize the tracing subscriber for logging
///
/// `RUST_LOG` wins over the CLI flag, which wins over the config file.
fn init_logging(log: &LogConfig, cli_level: Option<&str>) -> Result<()> {
    let mut log = log.clone();
    if let Some(level) = cli_level {
        log.level = level
            .parse::<LogLevel>()
            .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log.filter_directive()))
        .map_err(|e| anyhow::anyhow!("invalid log filter: {}", e))?;

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match (log.format, log.output) {
        (LogFormat::Console, LogOutput::Stdout) => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .boxed(),
        (LogFormat::Console, LogOutput::Stderr) => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_writer(std::io::stderr)
            .boxed(),
        (LogFormat::Json, LogOutput::Stdout) => fmt::layer().json().boxed(),
        (LogFormat::Json, LogOutput::Stderr) => {
            fmt::layer().json().with_writer(std::io::stderr).boxed()
        }
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    Ok(())
}
