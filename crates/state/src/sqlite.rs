//! SQLite-backed position store
//!
//! Uses a single `Mutex<Connection>` for thread safety. Positions only move
//! forward through guarded upserts, so a stale write is a no-op inside the
//! statement itself rather than a read-modify-write in Rust.

use std::path::Path;

use bytes::Bytes;
use exporter_protocol::{NO_POSITION, Position};
use exporter_routing::SinkId;
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::error::{Result, StateError};
use crate::store::{PositionStore, SinkState};

/// Idempotent DDL for the positions table
const CREATE_TABLES: &str = r"
CREATE TABLE IF NOT EXISTS sink_positions (
    sink_id TEXT PRIMARY KEY NOT NULL,
    position INTEGER NOT NULL,
    metadata_version INTEGER NOT NULL DEFAULT 0,
    metadata BLOB NOT NULL DEFAULT x'',
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
";

/// Durable position store
///
/// Create with [`SqlitePositionStore::open`] for file-backed persistence or
/// [`SqlitePositionStore::in_memory`] for tests.
pub struct SqlitePositionStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqlitePositionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlitePositionStore").finish_non_exhaustive()
    }
}

impl SqlitePositionStore {
    /// Open or create a position database at `path`
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Io`] if the directory can't be created, or
    /// [`StateError::Sqlite`] if the database can't be opened.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(|e| StateError::sqlite("open", e))?;
        debug!(path = %path.display(), "opened position store");
        Self::with_connection(conn)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StateError::sqlite("open", e))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(CREATE_TABLES)
            .map_err(|e| StateError::sqlite("create tables", e))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }
}

/// Convert a stored row into a sink id and state
fn decode_row(
    sink_id: String,
    position: i64,
    metadata_version: i64,
    metadata: Vec<u8>,
) -> Result<(SinkId, SinkState)> {
    let metadata_version = u32::try_from(metadata_version).map_err(|_| {
        StateError::corrupt(
            sink_id.as_str(),
            format!("metadata version {metadata_version} out of range"),
        )
    })?;
    let id = SinkId::new(&sink_id).map_err(|e| StateError::corrupt(sink_id, e.to_string()))?;
    Ok((
        id,
        SinkState {
            position,
            metadata_version,
            metadata: Bytes::from(metadata),
        },
    ))
}

impl PositionStore for SqlitePositionStore {
    fn state(&self, sink_id: &SinkId) -> Result<Option<SinkState>> {
        let conn = self.lock_conn();
        let row = conn
            .query_row(
                "SELECT position, metadata_version, metadata \
                 FROM sink_positions WHERE sink_id = ?1",
                params![sink_id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| StateError::sqlite("state", e))?;

        row.map(|(position, version, metadata)| {
            decode_row(sink_id.to_string(), position, version, metadata).map(|(_, state)| state)
        })
        .transpose()
    }

    fn states(&self) -> Result<Vec<(SinkId, SinkState)>> {
        let conn = self.lock_conn();
        let mut stmt = conn
            .prepare(
                "SELECT sink_id, position, metadata_version, metadata \
                 FROM sink_positions ORDER BY sink_id",
            )
            .map_err(|e| StateError::sqlite("states", e))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                ))
            })
            .map_err(|e| StateError::sqlite("states", e))?;

        let mut states = Vec::new();
        for row in rows {
            let (sink_id, position, version, metadata) =
                row.map_err(|e| StateError::sqlite("states", e))?;
            states.push(decode_row(sink_id, position, version, metadata)?);
        }
        Ok(states)
    }

    fn set_position(&self, sink_id: &SinkId, position: Position) -> Result<()> {
        let conn = self.lock_conn();
        conn.execute(
            "INSERT INTO sink_positions (sink_id, position) VALUES (?1, ?2) \
             ON CONFLICT(sink_id) DO UPDATE SET \
                 position = excluded.position, updated_at = datetime('now') \
             WHERE excluded.position > sink_positions.position",
            params![sink_id.as_str(), position],
        )
        .map_err(|e| StateError::sqlite("set_position", e))?;
        Ok(())
    }

    fn set_state(&self, sink_id: &SinkId, position: Position, metadata: Bytes) -> Result<()> {
        let conn = self.lock_conn();
        conn.execute(
            "INSERT INTO sink_positions (sink_id, position, metadata) VALUES (?1, ?2, ?3) \
             ON CONFLICT(sink_id) DO UPDATE SET \
                 position = excluded.position, metadata = excluded.metadata, \
                 updated_at = datetime('now') \
             WHERE excluded.position >= sink_positions.position",
            params![sink_id.as_str(), position, &metadata[..]],
        )
        .map_err(|e| StateError::sqlite("set_state", e))?;
        Ok(())
    }

    fn initialize(
        &self,
        sink_id: &SinkId,
        position: Position,
        metadata: Bytes,
        metadata_version: u32,
    ) -> Result<()> {
        let conn = self.lock_conn();
        conn.execute(
            "INSERT INTO sink_positions (sink_id, position, metadata_version, metadata) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(sink_id) DO UPDATE SET \
                 position = excluded.position, \
                 metadata_version = excluded.metadata_version, \
                 metadata = excluded.metadata, \
                 updated_at = datetime('now')",
            params![
                sink_id.as_str(),
                position,
                i64::from(metadata_version),
                &metadata[..]
            ],
        )
        .map_err(|e| StateError::sqlite("initialize", e))?;
        Ok(())
    }

    fn remove(&self, sink_id: &SinkId) -> Result<()> {
        let conn = self.lock_conn();
        conn.execute(
            "DELETE FROM sink_positions WHERE sink_id = ?1",
            params![sink_id.as_str()],
        )
        .map_err(|e| StateError::sqlite("remove", e))?;
        Ok(())
    }

    fn lowest_position(&self) -> Result<Position> {
        let conn = self.lock_conn();
        let lowest: Option<i64> = conn
            .query_row("SELECT MIN(position) FROM sink_positions", [], |row| {
                row.get(0)
            })
            .map_err(|e| StateError::sqlite("lowest_position", e))?;
        Ok(lowest.unwrap_or(NO_POSITION))
    }

    fn has_sinks(&self) -> Result<bool> {
        let conn = self.lock_conn();
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sink_positions)",
            [],
            |row| row.get(0),
        )
        .map_err(|e| StateError::sqlite("has_sinks", e))
    }
}

#[cfg(test)]
#[path = "sqlite_test.rs"]
mod sqlite_test;
