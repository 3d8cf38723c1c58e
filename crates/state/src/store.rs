//! Position store contract
//!
//! [`PositionStore`] is the storage contract for per-sink export progress.
//! Every operation is synchronous and atomic per sink id.

use bytes::Bytes;
use exporter_protocol::{NO_POSITION, Position};
use exporter_routing::SinkId;

use crate::error::Result;

/// Persisted progress of one sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkState {
    /// Last durably acknowledged position
    pub position: Position,
    /// Version of the metadata schema the sink was initialized with
    pub metadata_version: u32,
    /// Opaque sink metadata (empty when the sink never stored any)
    pub metadata: Bytes,
}

impl SinkState {
    /// State of a sink that has not acknowledged anything
    pub fn fresh(metadata_version: u32) -> Self {
        Self {
            position: NO_POSITION,
            metadata_version,
            metadata: Bytes::new(),
        }
    }
}

impl Default for SinkState {
    fn default() -> Self {
        Self::fresh(0)
    }
}

/// Storage contract for per-sink positions
///
/// Implementations must be `Send + Sync` for use behind
/// `Arc<dyn PositionStore>`.
///
/// `set_position` and `set_state` never move a stored position backwards;
/// only `initialize` may.
pub trait PositionStore: Send + Sync {
    /// Read the full state of a sink (`None` if unknown)
    fn state(&self, sink_id: &SinkId) -> Result<Option<SinkState>>;

    /// All stored states, ordered by sink id
    fn states(&self) -> Result<Vec<(SinkId, SinkState)>>;

    /// Upsert the position of a sink, keeping its metadata
    ///
    /// Ignored when `position` is lower than the stored position.
    fn set_position(&self, sink_id: &SinkId, position: Position) -> Result<()>;

    /// Upsert position and metadata of a sink
    ///
    /// Ignored when `position` is lower than the stored position.
    fn set_state(&self, sink_id: &SinkId, position: Position, metadata: Bytes) -> Result<()>;

    /// Replace the state of a sink unconditionally
    fn initialize(
        &self,
        sink_id: &SinkId,
        position: Position,
        metadata: Bytes,
        metadata_version: u32,
    ) -> Result<()>;

    /// Remove a sink's state (no-op if unknown)
    fn remove(&self, sink_id: &SinkId) -> Result<()>;

    /// Minimum position over all sinks, `NO_POSITION` if there are none
    ///
    /// The log must retain every entry after this position.
    fn lowest_position(&self) -> Result<Position>;

    /// Check whether any sink has stored state
    fn has_sinks(&self) -> Result<bool>;

    /// Last acknowledged position of a sink, `NO_POSITION` if unknown
    fn position(&self, sink_id: &SinkId) -> Result<Position> {
        Ok(self
            .state(sink_id)?
            .map_or(NO_POSITION, |state| state.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify the trait is object-safe (can be used as `dyn PositionStore`)
    #[test]
    fn test_trait_is_object_safe() {
        fn _assert_object_safe(_: &dyn PositionStore) {}
    }

    #[test]
    fn test_fresh_state() {
        let state = SinkState::fresh(3);
        assert_eq!(state.position, NO_POSITION);
        assert_eq!(state.metadata_version, 3);
        assert!(state.metadata.is_empty());
        assert_eq!(SinkState::default().metadata_version, 0);
    }
}
