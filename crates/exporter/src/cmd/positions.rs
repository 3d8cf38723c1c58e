//! Positions command
//!
//! Prints the stored state of every sink in a position store and the
//! lowest position, below which the log may be compacted.
//!
//! # Usage
//!
//! ```bash
//! exporter positions --config configs/exporter.toml
//! exporter positions --path data/positions.db --json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use exporter_protocol::{NO_POSITION, Position};
use exporter_state::{PositionStore, SqlitePositionStore};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::load_config;

#[derive(Args, Debug)]
pub struct PositionsArgs {
    /// Read the store path from this configuration file
    #[arg(short, long, conflicts_with = "path")]
    pub config: Option<PathBuf>,

    /// Path to the SQLite position store
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct SinkRow {
    sink_id: String,
    position: Position,
    metadata_version: u32,
    metadata_bytes: usize,
}

#[derive(Debug, Serialize)]
struct PositionsReport {
    store: String,
    lowest_position: Position,
    sinks: Vec<SinkRow>,
}

pub fn run(args: PositionsArgs) -> Result<()> {
    let path = store_path(&args)?;
    if !path.exists() {
        anyhow::bail!("position store not found: {}", path.display());
    }

    let report = read_report(&path)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn store_path(args: &PositionsArgs) -> Result<PathBuf> {
    if let Some(path) = &args.path {
        return Ok(path.clone());
    }
    let config = load_config(args.config.as_deref())?;
    config
        .state
        .path
        .context("no durable position store configured ([state] path is not set)")
}

fn read_report(path: &Path) -> Result<PositionsReport> {
    let store = SqlitePositionStore::open(path)
        .with_context(|| format!("failed to open position store {}", path.display()))?;

    let sinks = store
        .states()?
        .into_iter()
        .map(|(sink_id, state)| SinkRow {
            sink_id: sink_id.to_string(),
            position: state.position,
            metadata_version: state.metadata_version,
            metadata_bytes: state.metadata.len(),
        })
        .collect();

    Ok(PositionsReport {
        store: path.display().to_string(),
        lowest_position: store.lowest_position()?,
        sinks,
    })
}

fn print_report(report: &PositionsReport) {
    println!();
    println!("{}", "Sink Positions".bold());
    println!("{}", "─".repeat(60));
    println!("Store         {}", report.store.dimmed());
    println!("{}", "─".repeat(60));

    if report.sinks.is_empty() {
        println!("{}", "No sink state stored".yellow());
        return;
    }

    println!(
        "{:<24} {:>14} {:>9} {:>10}",
        "SINK", "POSITION", "VERSION", "METADATA"
    );
    for sink in &report.sinks {
        println!(
            "{:<24} {:>14} {:>9} {:>9}B",
            sink.sink_id.cyan(),
            format_position(sink.position),
            sink.metadata_version,
            sink.metadata_bytes
        );
    }
    println!();
    println!(
        "Lowest position: {}",
        format_position(report.lowest_position).bold()
    );
}

fn format_position(position: Position) -> String {
    if position == NO_POSITION {
        "-".to_string()
    } else {
        position.to_string()
    }
}
