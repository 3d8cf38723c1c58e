//! Pipeline error types
//!
//! Only unrecoverable failures are errors. Retryable sink failures and
//! malformed log entries are retried inside the director and never surface
//! here.

use exporter_protocol::PartitionId;
use exporter_routing::SinkId;
use exporter_sinks::SinkError;
use exporter_state::StateError;
use thiserror::Error;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A sink reported an unrecoverable failure
    #[error("sink '{sink_id}' failed: {source}")]
    Sink {
        sink_id: SinkId,
        #[source]
        source: SinkError,
    },

    /// The position store failed
    #[error("position store failure: {0}")]
    Store(#[from] StateError),

    /// A configured sink could not be turned into a descriptor
    #[error("sink '{sink_id}' is misconfigured: {message}")]
    Config { sink_id: String, message: String },

    /// The director has shut down
    #[error("export director for partition {partition_id} is closed")]
    Closed { partition_id: PartitionId },

    /// The director stopped after an unrecoverable failure
    #[error("export director for partition {partition_id} has failed: {reason}")]
    Failed {
        partition_id: PartitionId,
        reason: String,
    },
}

impl PipelineError {
    pub fn sink(sink_id: SinkId, source: SinkError) -> Self {
        Self::Sink { sink_id, source }
    }

    pub fn config(sink_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            sink_id: sink_id.into(),
            message: message.into(),
        }
    }

    /// Sink id the failure is attributed to, if any
    pub fn sink_id(&self) -> Option<&SinkId> {
        match self {
            Self::Sink { sink_id, .. } => Some(sink_id),
            _ => None,
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let id = SinkId::new("search").unwrap();
        let err = PipelineError::sink(id.clone(), SinkError::unrecoverable("index deleted"));
        assert!(err.to_string().contains("search"));
        assert!(err.to_string().contains("index deleted"));
        assert_eq!(err.sink_id(), Some(&id));

        let err = PipelineError::Closed { partition_id: 4 };
        assert!(err.to_string().contains("partition 4"));
        assert!(err.sink_id().is_none());

        let err = PipelineError::config("audit", "unknown sink type: kafka");
        assert!(err.to_string().contains("audit"));
    }
}
