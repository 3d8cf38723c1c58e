//! Sink plugin contract
//!
//! A sink is driven by exactly one partition's director, from a single task:
//!
//! ```text
//! configure(&mut SinkContext) -> open(controller) -> export(record)* -> close()
//! ```
//!
//! Records arrive in log order. Delivery is at-least-once: after a failure
//! or restart a sink may see a record again and must handle it
//! idempotently. Progress is acknowledged through the [`SinkController`]
//! passed to `open`; the log is retained until every sink has acknowledged.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use exporter_protocol::{PartitionId, Position, TypedRecord};
use exporter_routing::{RecordFilter, SinkId};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::common::SinkError;

/// A pluggable export destination
pub trait Sink: Send {
    /// Validate configuration and optionally narrow the record filter
    ///
    /// Called once before `open`. A retryable error is retried with backoff.
    fn configure(&mut self, _context: &mut SinkContext) -> Result<(), SinkError> {
        Ok(())
    }

    /// Start the sink
    ///
    /// Only called on the partition leader. The controller stays valid
    /// until `close` returns.
    fn open(&mut self, controller: Arc<dyn SinkController>) -> Result<(), SinkError>;

    /// Export one record
    ///
    /// A retryable error causes the same record to be offered again.
    fn export(&mut self, record: &TypedRecord) -> Result<(), SinkError>;

    /// Release resources
    ///
    /// Best effort; called even if `configure` or `open` never succeeded.
    fn close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Callback run on the director's task after a delay
pub type ScheduledTask = Box<dyn FnOnce() + Send + 'static>;

/// Director-side services available to an open sink
pub trait SinkController: Send + Sync {
    /// Acknowledge every record up to and including `position`
    ///
    /// Acknowledging a position lower than a previous acknowledgement has
    /// no effect.
    fn update_position(&self, position: Position);

    /// Acknowledge `position` and store opaque metadata alongside it
    fn update_position_with_metadata(&self, position: Position, metadata: Bytes);

    /// Metadata last stored for this sink (`None` if never stored)
    fn read_metadata(&self) -> Option<Bytes>;

    /// Run `task` on the director's task after `delay`
    ///
    /// The task is dropped without running if the handle is cancelled, the
    /// sink is disabled or the director closes first.
    fn schedule_cancellable_task(&self, delay: Duration, task: ScheduledTask) -> TaskHandle;
}

/// Handle to a scheduled task
#[derive(Debug, Clone)]
pub struct TaskHandle {
    token: CancellationToken,
}

impl TaskHandle {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Handle for a task that will never run
    pub fn cancelled() -> Self {
        let token = CancellationToken::new();
        token.cancel();
        Self { token }
    }

    /// Prevent the task from running if it has not yet run
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Configuration context passed to [`Sink::configure`]
#[derive(Debug, Clone)]
pub struct SinkContext {
    sink_id: SinkId,
    partition_id: PartitionId,
    config: toml::Table,
    filter: RecordFilter,
}

impl SinkContext {
    pub fn new(
        sink_id: SinkId,
        partition_id: PartitionId,
        config: toml::Table,
        filter: RecordFilter,
    ) -> Self {
        Self {
            sink_id,
            partition_id,
            config,
            filter,
        }
    }

    #[inline]
    pub fn sink_id(&self) -> &SinkId {
        &self.sink_id
    }

    #[inline]
    pub fn partition_id(&self) -> PartitionId {
        self.partition_id
    }

    /// Raw sink-specific configuration table
    #[inline]
    pub fn config(&self) -> &toml::Table {
        &self.config
    }

    /// Deserialize the sink-specific configuration
    pub fn parse_config<T: DeserializeOwned>(&self) -> Result<T, SinkError> {
        toml::Value::Table(self.config.clone())
            .try_into()
            .map_err(|e| SinkError::config(format!("sink '{}': {e}", self.sink_id)))
    }

    /// Filter the sink will be registered with
    #[inline]
    pub fn filter(&self) -> &RecordFilter {
        &self.filter
    }

    /// Replace the configured filter
    pub fn set_filter(&mut self, filter: RecordFilter) {
        self.filter = filter;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct TestOptions {
        url: String,
        #[serde(default)]
        batch: u32,
    }

    fn context(config: &str) -> SinkContext {
        SinkContext::new(
            SinkId::new("test").unwrap(),
            3,
            config.parse::<toml::Table>().unwrap(),
            RecordFilter::accept_all(),
        )
    }

    #[test]
    fn test_trait_objects() {
        fn _sink(_: &dyn Sink) {}
        fn _controller(_: &dyn SinkController) {}
    }

    #[test]
    fn test_parse_config() {
        let ctx = context("url = \"http://localhost:9200\"\nbatch = 10");
        let options: TestOptions = ctx.parse_config().unwrap();
        assert_eq!(options.url, "http://localhost:9200");
        assert_eq!(options.batch, 10);
        assert_eq!(ctx.partition_id(), 3);
    }

    #[test]
    fn test_parse_config_error_names_sink() {
        let err = context("batch = 1").parse_config::<TestOptions>().unwrap_err();
        assert!(matches!(err, SinkError::Config(_)));
        assert!(err.to_string().contains("test"));
    }

    #[test]
    fn test_set_filter() {
        let mut ctx = context("");
        ctx.set_filter(RecordFilter::accept_none());
        assert!(ctx.filter().is_empty());
    }

    #[test]
    fn test_task_handle_cancel() {
        let handle = TaskHandle::new(CancellationToken::new());
        let clone = handle.clone();
        assert!(!handle.is_cancelled());
        clone.cancel();
        assert!(handle.is_cancelled());
        assert!(TaskHandle::cancelled().is_cancelled());
    }
}
