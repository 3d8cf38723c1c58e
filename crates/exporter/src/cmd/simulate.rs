//! Simulate command
//!
//! Runs an active director over an in-memory log fed with synthetic
//! records, using the configured sinks and position store. With
//! `--follower` a passive director shares the partition's state topic and
//! shows the positions a follower would take over with.
//!
//! # Usage
//!
//! ```bash
//! exporter simulate
//! exporter simulate --config configs/exporter.toml --records 500 --interval-ms 5
//! exporter simulate --follower
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use exporter_config::{Config, DirectorMode};
use exporter_distribution::DistributionHub;
use exporter_pipeline::{
    ConfiguredSink, ExportDirector, ExportDirectorHandle, MetricsSnapshot, configured_sinks,
};
use exporter_protocol::{LogEntry, MemoryLog, NO_POSITION, Position, RecordKind, RecordMetadata, ValueKind};
use exporter_routing::SinkId;
use exporter_sinks::SinkRegistry;
use exporter_state::{MemoryPositionStore, PositionStore, SharedPositionStore, open_store};
use tokio::signal;
use tracing::{error, info, warn};

/// Value kinds cycled through by the generator
const SIMULATED_KINDS: [ValueKind; 4] = [
    ValueKind::Job,
    ValueKind::ProcessInstance,
    ValueKind::Variable,
    ValueKind::Incident,
];

/// How often progress is checked while waiting for the sinks
const PROGRESS_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Path to configuration file (defaults are used if not specified)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of records to append
    #[arg(short, long, default_value_t = 100)]
    pub records: u64,

    /// Delay between appended records in milliseconds
    #[arg(long, default_value_t = 10)]
    pub interval_ms: u64,

    /// Also run a passive director that follows distributed positions
    #[arg(long)]
    pub follower: bool,
}

pub async fn run(args: SimulateArgs, mut config: Config) -> Result<()> {
    if config.director.mode == DirectorMode::Passive {
        warn!("simulation always runs an active director, ignoring passive mode");
        config.director.mode = DirectorMode::Active;
    }
    let partition_id = config.director.partition_id;

    let store = open_store(config.state.path.as_deref()).context("failed to open position store")?;
    let sinks = simulated_sinks(&config)?;

    let hub = DistributionHub::new();
    let topic = hub.topic(partition_id);
    let maintenance = topic.spawn_maintenance();

    let log = MemoryLog::new();
    let first = next_position(&store)?;
    let last = first + args.records as Position - 1;

    info!(
        partition = partition_id,
        sink_count = sinks.len(),
        records = args.records,
        first_position = first,
        durable = config.state.is_durable(),
        "simulation starting"
    );

    let follower = args.follower.then(|| {
        let mut director = config.director.clone();
        director.mode = DirectorMode::Passive;
        let store: SharedPositionStore = Arc::new(MemoryPositionStore::new());
        let handle = ExportDirector::new(
            director,
            Arc::clone(&store),
            Arc::new(log.clone()),
            Arc::clone(&topic),
        )
        .with_sinks(sinks.clone())
        .spawn();
        (handle, store)
    });

    let leader = ExportDirector::new(
        config.director.clone(),
        Arc::clone(&store),
        Arc::new(log.clone()),
        Arc::clone(&topic),
    )
    .with_sinks(sinks)
    .spawn();

    let producer = {
        let log = log.clone();
        let interval = Duration::from_millis(args.interval_ms);
        tokio::spawn(async move {
            for position in first..=last {
                if let Err(e) = log.append(simulated_entry(position)) {
                    error!(position, error = %e, "failed to append simulated record");
                    return;
                }
                if !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
            }
        })
    };

    tokio::select! {
        caught_up = wait_for_position(&leader, last) => {
            if caught_up {
                info!(partition = partition_id, position = last, "sinks caught up");
            }
        }
        _ = signal::ctrl_c() => {
            info!("interrupted, stopping simulation...");
        }
    }

    producer.abort();
    leader.close().await;
    report(&leader.metrics_snapshot(), &store)?;

    if let Some((handle, store)) = follower {
        // One more distribution round reaches the follower before it stops
        tokio::time::sleep(config.director.distribution_interval().min(Duration::from_secs(1)))
            .await;
        handle.close().await;
        for (sink_id, state) in store.states()? {
            info!(
                partition = partition_id,
                sink_id = %sink_id,
                position = state.position,
                "follower position"
            );
        }
    }

    hub.close_all();
    maintenance.abort();
    info!("simulation complete");
    Ok(())
}

/// Configured sinks, or a single stdout sink when none are configured
fn simulated_sinks(config: &Config) -> Result<Vec<ConfiguredSink>> {
    let registry = SinkRegistry::with_builtin();
    let sinks = configured_sinks(&config.sinks, &registry)?;
    if !sinks.is_empty() {
        return Ok(sinks);
    }

    info!("no sinks configured, exporting to stdout");
    let descriptor = registry.descriptor(SinkId::new("stdout")?, "stdout")?;
    Ok(vec![ConfiguredSink::new(descriptor)])
}

/// First position after everything already stored
fn next_position(store: &SharedPositionStore) -> Result<Position> {
    let highest = store
        .states()?
        .into_iter()
        .map(|(_, state)| state.position)
        .max()
        .unwrap_or(NO_POSITION);
    Ok(highest.max(0) + 1)
}

fn simulated_entry(position: Position) -> LogEntry {
    let value_kind = SIMULATED_KINDS[position as usize % SIMULATED_KINDS.len()];
    let payload = serde_json::json!({
        "simulated": true,
        "sequence": position,
        "valueType": value_kind.as_str(),
    });
    LogEntry::new(
        position,
        RecordMetadata::new(RecordKind::Event, value_kind),
        payload.to_string(),
    )
    .with_key(position)
    .with_timestamp(Utc::now().timestamp_millis())
}

/// Wait until every sink acknowledged `target`; false if the director
/// failed or closed first
async fn wait_for_position(handle: &ExportDirectorHandle, target: Position) -> bool {
    let mut interval = tokio::time::interval(PROGRESS_INTERVAL);
    loop {
        interval.tick().await;

        let health = handle.health();
        if let Some(failure) = health.failure {
            error!(partition = handle.partition_id(), failure = %failure, "director failed");
            return false;
        }
        match handle.lowest_position().await {
            Ok(position) if position >= target => return true,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "director stopped before sinks caught up");
                return false;
            }
        }
    }
}

fn report(snapshot: &MetricsSnapshot, store: &SharedPositionStore) -> Result<()> {
    info!(
        records_read = snapshot.records_read,
        records_exported = snapshot.records_exported,
        records_skipped = snapshot.records_skipped,
        export_failures = snapshot.export_failures,
        retries = snapshot.retries,
        distributions_sent = snapshot.distributions_sent,
        lowest_position = store.lowest_position()?,
        "simulation metrics"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_entry_decodes() {
        let entry = simulated_entry(6);
        let record = exporter_protocol::TypedRecord::decode(&entry)
            .unwrap()
            .unwrap();
        assert_eq!(record.position(), 6);
        assert_eq!(record.metadata().value_kind(), ValueKind::Variable);
        assert_eq!(
            record.field("sequence").and_then(|v| v.as_i64()),
            Some(6)
        );
    }

    #[test]
    fn test_next_position_follows_stored_state() {
        let store: SharedPositionStore = Arc::new(MemoryPositionStore::new());
        assert_eq!(next_position(&store).unwrap(), 1);

        store
            .initialize(&SinkId::new("a").unwrap(), 41, Default::default(), 0)
            .unwrap();
        assert_eq!(next_position(&store).unwrap(), 42);
    }

    #[test]
    fn test_default_sink_is_stdout() {
        let sinks = simulated_sinks(&Config::default()).unwrap();
        assert_eq!(sinks.len(), 1);
        assert_eq!(sinks[0].descriptor.sink_type(), "stdout");
    }

    #[tokio::test]
    async fn test_simulation_runs_to_completion() {
        let config: Config = r#"
[director]
distribution_interval_ms = 20

[sinks.discard]
type = "null"
"#
        .parse()
        .unwrap();

        let args = SimulateArgs {
            config: None,
            records: 20,
            interval_ms: 0,
            follower: true,
        };
        tokio::time::timeout(Duration::from_secs(10), run(args, config))
            .await
            .unwrap()
            .unwrap();
    }
}
