//! Export Pipeline - State
//!
//! Durable per-sink export progress: last acknowledged position, opaque
//! metadata and its schema version. The minimum position over all sinks
//! is the partition's safe log-truncation watermark.
//!
//! Two implementations of [`PositionStore`]:
//! - [`MemoryPositionStore`] - process memory, for embedding and tests
//! - [`SqlitePositionStore`] - file-backed SQLite database

mod error;
mod memory;
mod sqlite;
mod store;


use std::path::Path;
use std::sync::Arc;

pub use error::{Result, StateError};
pub use memory::MemoryPositionStore;
pub use sqlite::SqlitePositionStore;
pub use store::{PositionStore, SinkState};

/// Shared handle to a position store
pub type SharedPositionStore = Arc<dyn PositionStore>;

/// Open the store for a configured path, in memory when `None`
pub fn open_store(path: Option<&Path>) -> Result<SharedPositionStore> {
    match path {
        Some(path) => Ok(Arc::new(SqlitePositionStore::open(path)?)),
        None => Ok(Arc::new(MemoryPositionStore::new())),
    }
}
