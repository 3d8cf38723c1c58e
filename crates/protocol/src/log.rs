//! Log reader contract
//!
//! The replicated log is owned by the consensus layer. The export pipeline
//! only needs a cursor over committed entries and a way to learn that new
//! entries were committed, so it can park instead of polling.
//!
//! [`MemoryLog`] implements the contract over a vector and is used for
//! embedding and tests.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;

use crate::entry::LogEntry;
use crate::error::ProtocolError;
use crate::{NO_POSITION, Position};

/// Cursor over the committed entries of one partition
///
/// Readers never block: when no entry is available `has_next` returns false
/// and the caller waits on [`LogStream::subscribe`].
pub trait LogReader: Send {
    /// Check if a committed entry is available at the cursor
    fn has_next(&mut self) -> bool;

    /// Return the entry at the cursor and advance past it
    fn next_entry(&mut self) -> Option<LogEntry>;

    /// Move the cursor so the next entry returned is the first entry with a
    /// position at or after `position`
    ///
    /// Returns `true` if such an entry exists right now.
    fn seek_to(&mut self, position: Position) -> bool;
}

/// Source of readers and commit notifications for one partition
pub trait LogStream: Send + Sync {
    /// Open a new reader positioned at the start of the log
    fn new_reader(&self) -> Box<dyn LogReader>;

    /// Subscribe to commit notifications
    ///
    /// The receiver observes the last committed position. Dropping the
    /// receiver unsubscribes.
    fn subscribe(&self) -> watch::Receiver<Position>;
}

/// In-memory log
///
/// Cloning is cheap and every clone appends to the same log.
#[derive(Debug, Clone)]
pub struct MemoryLog {
    entries: Arc<RwLock<Vec<LogEntry>>>,
    committed: Arc<watch::Sender<Position>>,
}

impl Default for MemoryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLog {
    /// Create an empty log
    pub fn new() -> Self {
        let (committed, _) = watch::channel(NO_POSITION);
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            committed: Arc::new(committed),
        }
    }

    /// Append a committed entry and notify subscribers
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::PositionNotIncreasing`] if the entry's
    /// position does not follow the last appended position.
    pub fn append(&self, entry: LogEntry) -> Result<(), ProtocolError> {
        let position = entry.position();
        {
            let mut entries = self.entries.write();
            if let Some(last) = entries.last()
                && last.position() >= position
            {
                return Err(ProtocolError::not_increasing(position, last.position()));
            }
            entries.push(entry);
        }
        self.committed.send_replace(position);
        Ok(())
    }

    /// Append several entries in order
    pub fn append_all(
        &self,
        entries: impl IntoIterator<Item = LogEntry>,
    ) -> Result<(), ProtocolError> {
        for entry in entries {
            self.append(entry)?;
        }
        Ok(())
    }

    /// Position of the last appended entry (`NO_POSITION` when empty)
    pub fn last_position(&self) -> Position {
        self.entries
            .read()
            .last()
            .map_or(NO_POSITION, LogEntry::position)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl LogStream for MemoryLog {
    fn new_reader(&self) -> Box<dyn LogReader> {
        Box::new(MemoryLogReader {
            entries: Arc::clone(&self.entries),
            index: 0,
        })
    }

    fn subscribe(&self) -> watch::Receiver<Position> {
        self.committed.subscribe()
    }
}

/// Reader over a [`MemoryLog`]
#[derive(Debug)]
pub struct MemoryLogReader {
    entries: Arc<RwLock<Vec<LogEntry>>>,
    index: usize,
}

impl LogReader for MemoryLogReader {
    fn has_next(&mut self) -> bool {
        self.index < self.entries.read().len()
    }

    fn next_entry(&mut self) -> Option<LogEntry> {
        let entry = self.entries.read().get(self.index).cloned()?;
        self.index += 1;
        Some(entry)
    }

    fn seek_to(&mut self, position: Position) -> bool {
        let entries = self.entries.read();
        self.index = entries.partition_point(|e| e.position() < position);
        self.index < entries.len()
    }
}

#[cfg(test)]
#[path = "log_test.rs"]
mod log_test;
