//! Director phase and health

use std::fmt;

use exporter_protocol::{PartitionId, Position};
use exporter_routing::SinkId;

/// What the director is doing with records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorPhase {
    /// Reading the log and delivering records (or applying distributed
    /// state on a follower)
    Exporting,
    /// Nothing is handed to any sink
    Paused,
    /// Records keep flowing; progress is kept in memory until resume
    SoftPaused,
    /// Terminal; every sink is closed
    Closed,
}

impl DirectorPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exporting => "exporting",
            Self::Paused => "paused",
            Self::SoftPaused => "soft_paused",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for DirectorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    /// An unrecoverable failure stopped processing
    Failed,
}

/// Context of the failure that stopped a director
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureContext {
    /// Sink the failure is attributed to, if any
    pub sink_id: Option<SinkId>,
    /// Position being processed when it failed, if any
    pub position: Option<Position>,
    pub message: String,
}

impl fmt::Display for FailureContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(sink_id) = &self.sink_id {
            write!(f, " (sink {sink_id})")?;
        }
        if let Some(position) = self.position {
            write!(f, " at position {position}")?;
        }
        Ok(())
    }
}

/// Health of one partition's director
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub partition_id: PartitionId,
    pub status: HealthStatus,
    pub phase: DirectorPhase,
    /// No sink is enabled
    pub idle: bool,
    pub failure: Option<FailureContext>,
}

impl HealthReport {
    pub(crate) fn starting(partition_id: PartitionId) -> Self {
        Self {
            partition_id,
            status: HealthStatus::Healthy,
            phase: DirectorPhase::Exporting,
            idle: false,
            failure: None,
        }
    }

    #[inline]
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Notified once when a director fails
///
/// Listeners run on the director task and must not block.
pub trait FailureListener: Send + Sync {
    fn on_failure(&self, report: &HealthReport);
}

impl<F> FailureListener for F
where
    F: Fn(&HealthReport) + Send + Sync,
{
    fn on_failure(&self, report: &HealthReport) {
        self(report)
    }
}
