//! Export Pipeline - Protocol
//!
//! Core types that flow from the partition log into the export pipeline:
//! - `LogEntry` - committed, immutable log entry addressed by a position
//! - `RecordMetadata` - fixed header (record kind, value kind, intent)
//! - `TypedRecord` - the decoded view of an entry, decoded once per position
//! - `LogReader` / `LogStream` - the cursor contract of the log layer
//!
//! # Positions
//!
//! Positions are strictly increasing within a partition but not necessarily
//! dense. `NO_POSITION` (-1) means "before the start of the log" and is the
//! initial position of every fresh sink.

mod entry;
mod error;
mod log;
mod record;
mod schema;

pub use entry::{LogEntry, RecordMetadata};
pub use error::ProtocolError;
pub use log::{LogReader, LogStream, MemoryLog, MemoryLogReader};
pub use record::TypedRecord;
pub use schema::{RecordKind, ValueKind};

// Re-export bytes for convenience
pub use bytes::Bytes;

/// Logical offset of an entry within a partition's log
pub type Position = i64;

/// Sentinel for "no position" (before the log start, or unknown sink)
pub const NO_POSITION: Position = -1;

/// Identifier of a partition; every partition runs its own pipeline
pub type PartitionId = u32;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

// Test modules - only compiled during testing
#[cfg(test)]
mod record_test;
#[cfg(test)]
mod schema_test;
