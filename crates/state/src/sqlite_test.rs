//! Tests for the SQLite position store

use super::*;
use crate::contract_test;

fn store() -> SqlitePositionStore {
    SqlitePositionStore::in_memory().unwrap()
}

#[test]
fn test_contract_unknown_sink() {
    contract_test::unknown_sink(&store());
}

#[test]
fn test_contract_set_position_never_decreases() {
    contract_test::set_position_never_decreases(&store());
}

#[test]
fn test_contract_set_state_keeps_metadata() {
    contract_test::set_state_and_metadata(&store());
}

#[test]
fn test_contract_initialize_overrides() {
    contract_test::initialize_overrides(&store());
}

#[test]
fn test_contract_lowest_position() {
    contract_test::lowest_position(&store());
}

#[test]
fn test_contract_remove() {
    contract_test::remove(&store());
}

#[test]
fn test_contract_states_ordered() {
    contract_test::states_ordered(&store());
}

#[test]
fn test_positions_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("positions.db");
    let audit = SinkId::new("audit").unwrap();

    {
        let store = SqlitePositionStore::open(&path).unwrap();
        store
            .initialize(&audit, NO_POSITION, Bytes::new(), 2)
            .unwrap();
        store
            .set_state(&audit, 42, Bytes::from_static(b"offset"))
            .unwrap();
    }

    let store = SqlitePositionStore::open(&path).unwrap();
    let state = store.state(&audit).unwrap().unwrap();
    assert_eq!(state.position, 42);
    assert_eq!(state.metadata_version, 2);
    assert_eq!(state.metadata, Bytes::from_static(b"offset"));
    assert_eq!(store.lowest_position().unwrap(), 42);
}

#[test]
fn test_reopen_is_idempotent_on_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("positions.db");
    SqlitePositionStore::open(&path).unwrap();
    SqlitePositionStore::open(&path).unwrap();
}

#[test]
fn test_corrupt_version_is_reported() {
    let store = store();
    store
        .lock_conn()
        .execute(
            "INSERT INTO sink_positions (sink_id, position, metadata_version) VALUES ('bad', 1, -5)",
            [],
        )
        .unwrap();

    let err = store.states().unwrap_err();
    assert!(matches!(err, StateError::Corrupt { .. }));
    assert!(err.to_string().contains("bad"));
}
