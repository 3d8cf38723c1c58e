//! Export director handle
//!
//! Cheap to clone. Every control call is queued to the director task and
//! resolves once the director applied it.

use std::sync::Arc;

use exporter_protocol::{PartitionId, Position};
use exporter_routing::SinkId;
use exporter_sinks::SinkDescriptor;
use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};

use crate::command::Command;
use crate::error::{PipelineError, Result};
use crate::health::{DirectorPhase, FailureListener, HealthReport};
use crate::metrics::{DirectorMetrics, MetricsSnapshot};

#[derive(Clone)]
pub struct ExportDirectorHandle {
    partition_id: PartitionId,
    commands: mpsc::Sender<Command>,
    metrics: Arc<DirectorMetrics>,
    health: Arc<RwLock<HealthReport>>,
}

impl ExportDirectorHandle {
    pub(crate) fn new(
        partition_id: PartitionId,
        commands: mpsc::Sender<Command>,
        metrics: Arc<DirectorMetrics>,
        health: Arc<RwLock<HealthReport>>,
    ) -> Self {
        Self {
            partition_id,
            commands,
            metrics,
            health,
        }
    }

    #[inline]
    pub fn partition_id(&self) -> PartitionId {
        self.partition_id
    }

    /// Enable a sink while running
    ///
    /// Returns `Ok(false)` if a sink with the same id is already enabled.
    /// `init_from` seeds the new sink's state from a sibling when it has
    /// none (or an older metadata version).
    pub async fn enable_sink(
        &self,
        descriptor: SinkDescriptor,
        init_from: Option<SinkId>,
    ) -> Result<bool> {
        self.request(|reply| Command::EnableSink {
            descriptor,
            init_from,
            reply,
        })
        .await?
    }

    /// Disable a sink and drop its stored state
    ///
    /// Returns `Ok(false)` if the sink is not enabled or the director is
    /// closed.
    pub async fn disable_sink(&self, sink_id: &SinkId) -> Result<bool> {
        let sink_id = sink_id.clone();
        match self
            .request(|reply| Command::DisableSink { sink_id, reply })
            .await
        {
            Ok(result) => result,
            Err(PipelineError::Closed { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Stop handing records to sinks
    pub async fn pause(&self) {
        let _ = self.request(|reply| Command::Pause { reply }).await;
    }

    /// Keep exporting but hold acknowledged positions in memory
    pub async fn soft_pause(&self) {
        let _ = self.request(|reply| Command::SoftPause { reply }).await;
    }

    /// Leave a pause or soft pause; soft-paused positions are persisted
    pub async fn resume(&self) -> Result<()> {
        match self.request(|reply| Command::Resume { reply }).await {
            Ok(result) => result,
            Err(PipelineError::Closed { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Lowest stored position over all sinks
    ///
    /// The log must keep every entry after it.
    pub async fn lowest_position(&self) -> Result<Position> {
        self.request(|reply| Command::LowestPosition { reply })
            .await?
    }

    /// Register a listener for an unrecoverable failure
    ///
    /// Called right away if the director already failed.
    pub async fn add_failure_listener(&self, listener: impl FailureListener + 'static) {
        let listener: Arc<dyn FailureListener> = Arc::new(listener);
        let _ = self
            .request(|reply| Command::AddFailureListener { listener, reply })
            .await;
    }

    /// Close every sink and stop the director
    ///
    /// Idempotent; later control calls are no-ops or fail with
    /// [`PipelineError::Closed`].
    pub async fn close(&self) {
        let _ = self.request(|reply| Command::Close { reply }).await;
    }

    /// Phase as of the last command the director handled
    ///
    /// Read from the published health snapshot rather than through the
    /// command queue. The director publishes before replying, so the phase
    /// seen after an awaited control call reflects that call.
    pub fn phase(&self) -> DirectorPhase {
        self.health.read().phase
    }

    pub fn health(&self) -> HealthReport {
        self.health.read().clone()
    }

    pub fn metrics(&self) -> &Arc<DirectorMetrics> {
        &self.metrics
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Whether the director task has stopped
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| self.closed())?;
        response.await.map_err(|_| self.closed())
    }

    fn closed(&self) -> PipelineError {
        PipelineError::Closed {
            partition_id: self.partition_id,
        }
    }
}

impl std::fmt::Debug for ExportDirectorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportDirectorHandle")
            .field("partition_id", &self.partition_id)
            .field("phase", &self.phase())
            .field("closed", &self.is_closed())
            .finish()
    }
}
