//! Null sink - acknowledges and discards every record
//!
//! Used to measure pipeline throughput without any I/O, and as a
//! placeholder that keeps the log from being retained for a sink that is
//! not wired yet.
//!
//! # Configuration
//!
//! ```toml
//! [sinks.blackhole]
//! type = "null"
//! acknowledge = true   # set to false to hold back log truncation
//! ```

use std::sync::Arc;

use exporter_protocol::TypedRecord;
use serde::Deserialize;

use crate::common::{MetricsSnapshot, SinkError, SinkMetrics};
use crate::sink::{Sink, SinkContext, SinkController};

/// Configuration for null sink
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NullSinkConfig {
    /// Acknowledge each record as soon as it is received
    pub acknowledge: bool,
}

impl Default for NullSinkConfig {
    fn default() -> Self {
        Self { acknowledge: true }
    }
}

/// Null sink that discards all received records
pub struct NullSink {
    config: NullSinkConfig,
    controller: Option<Arc<dyn SinkController>>,
    metrics: Arc<SinkMetrics>,
}

impl Default for NullSink {
    fn default() -> Self {
        Self::new()
    }
}

impl NullSink {
    pub fn new() -> Self {
        Self::with_config(NullSinkConfig::default())
    }

    pub fn with_config(config: NullSinkConfig) -> Self {
        Self {
            config,
            controller: None,
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    /// Shared metrics handle, valid after the sink is moved into a container
    pub fn metrics_handle(&self) -> Arc<SinkMetrics> {
        Arc::clone(&self.metrics)
    }

    #[inline]
    pub fn config(&self) -> &NullSinkConfig {
        &self.config
    }
}

impl Sink for NullSink {
    fn configure(&mut self, context: &mut SinkContext) -> Result<(), SinkError> {
        self.config = context.parse_config()?;
        Ok(())
    }

    fn open(&mut self, controller: Arc<dyn SinkController>) -> Result<(), SinkError> {
        self.controller = Some(controller);
        Ok(())
    }

    fn export(&mut self, record: &TypedRecord) -> Result<(), SinkError> {
        self.metrics.record_received();
        self.metrics.record_exported(0);

        if self.config.acknowledge
            && let Some(controller) = &self.controller
        {
            controller.update_position(record.position());
            self.metrics.acknowledged();
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        let snapshot: MetricsSnapshot = self.metrics.snapshot();
        tracing::debug!(
            records = snapshot.records_received,
            acknowledgements = snapshot.acknowledgements,
            "null sink closed"
        );
        self.controller = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "null_test.rs"]
mod null_test;
