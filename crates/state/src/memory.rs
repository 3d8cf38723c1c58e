//! In-memory position store

use std::collections::BTreeMap;

use bytes::Bytes;
use exporter_protocol::{NO_POSITION, Position};
use exporter_routing::SinkId;
use parking_lot::RwLock;

use crate::error::Result;
use crate::store::{PositionStore, SinkState};

/// Position store held in memory
///
/// Loses everything on restart; used for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryPositionStore {
    states: RwLock<BTreeMap<SinkId, SinkState>>,
}

impl MemoryPositionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PositionStore for MemoryPositionStore {
    fn state(&self, sink_id: &SinkId) -> Result<Option<SinkState>> {
        Ok(self.states.read().get(sink_id).cloned())
    }

    fn states(&self) -> Result<Vec<(SinkId, SinkState)>> {
        Ok(self
            .states
            .read()
            .iter()
            .map(|(id, state)| (id.clone(), state.clone()))
            .collect())
    }

    fn set_position(&self, sink_id: &SinkId, position: Position) -> Result<()> {
        let mut states = self.states.write();
        let state = states.entry(sink_id.clone()).or_default();
        if position > state.position {
            state.position = position;
        }
        Ok(())
    }

    fn set_state(&self, sink_id: &SinkId, position: Position, metadata: Bytes) -> Result<()> {
        let mut states = self.states.write();
        let state = states.entry(sink_id.clone()).or_default();
        if position >= state.position {
            state.position = position;
            state.metadata = metadata;
        }
        Ok(())
    }

    fn initialize(
        &self,
        sink_id: &SinkId,
        position: Position,
        metadata: Bytes,
        metadata_version: u32,
    ) -> Result<()> {
        self.states.write().insert(
            sink_id.clone(),
            SinkState {
                position,
                metadata_version,
                metadata,
            },
        );
        Ok(())
    }

    fn remove(&self, sink_id: &SinkId) -> Result<()> {
        self.states.write().remove(sink_id);
        Ok(())
    }

    fn lowest_position(&self) -> Result<Position> {
        Ok(self
            .states
            .read()
            .values()
            .map(|state| state.position)
            .min()
            .unwrap_or(NO_POSITION))
    }

    fn has_sinks(&self) -> Result<bool> {
        Ok(!self.states.read().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract_test;

    #[test]
    fn test_contract_unknown_sink() {
        contract_test::unknown_sink(&MemoryPositionStore::new());
    }

    #[test]
    fn test_contract_set_position_never_decreases() {
        contract_test::set_position_never_decreases(&MemoryPositionStore::new());
    }

    #[test]
    fn test_contract_set_state_keeps_metadata() {
        contract_test::set_state_and_metadata(&MemoryPositionStore::new());
    }

    #[test]
    fn test_contract_initialize_overrides() {
        contract_test::initialize_overrides(&MemoryPositionStore::new());
    }

    #[test]
    fn test_contract_lowest_position() {
        contract_test::lowest_position(&MemoryPositionStore::new());
    }

    #[test]
    fn test_contract_remove() {
        contract_test::remove(&MemoryPositionStore::new());
    }

    #[test]
    fn test_contract_states_ordered() {
        contract_test::states_ordered(&MemoryPositionStore::new());
    }
}
