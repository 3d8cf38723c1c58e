//! LogEntry - immutable entry of a partition's committed log
//!
//! Entries are produced by the log layer and are read-only to the export
//! pipeline. The payload is kept as `bytes::Bytes` so cloning an entry is
//! O(1) regardless of payload size.

use bytes::Bytes;

use crate::Position;
use crate::schema::{RecordKind, ValueKind};

/// Fixed header carried by every log entry
///
/// The value kind is kept as the raw byte so entries written by a newer
/// broker (with value kinds this build doesn't know) can still be read and
/// skipped instead of failing the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordMetadata {
    record_kind: RecordKind,
    raw_value_kind: u8,
    intent: u8,
}

impl RecordMetadata {
    /// Create metadata for a known value kind
    #[inline]
    pub const fn new(record_kind: RecordKind, value_kind: ValueKind) -> Self {
        Self {
            record_kind,
            raw_value_kind: value_kind.as_u8(),
            intent: 0,
        }
    }

    /// Create metadata from the raw header bytes
    #[inline]
    pub const fn from_raw(record_kind: u8, value_kind: u8, intent: u8) -> Self {
        Self {
            record_kind: RecordKind::from_u8(record_kind),
            raw_value_kind: value_kind,
            intent,
        }
    }

    /// Set the intent byte
    #[inline]
    #[must_use]
    pub const fn with_intent(mut self, intent: u8) -> Self {
        self.intent = intent;
        self
    }

    #[inline]
    pub const fn record_kind(&self) -> RecordKind {
        self.record_kind
    }

    /// Decoded value kind (`ValueKind::Unknown` for unrecognised bytes)
    #[inline]
    pub const fn value_kind(&self) -> ValueKind {
        ValueKind::from_u8(self.raw_value_kind)
    }

    /// Raw value kind byte as written to the log
    #[inline]
    pub const fn raw_value_kind(&self) -> u8 {
        self.raw_value_kind
    }

    #[inline]
    pub const fn intent(&self) -> u8 {
        self.intent
    }
}

/// One committed entry of a partition's log
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Strictly increasing within a partition
    position: Position,

    /// Key of the entity the record refers to (-1 when not applicable)
    key: i64,

    /// Commit timestamp in milliseconds since the Unix epoch
    timestamp: i64,

    metadata: RecordMetadata,

    /// Serialized record value - zero-copy via Bytes
    payload: Bytes,
}

impl LogEntry {
    /// Create a new entry
    pub fn new(position: Position, metadata: RecordMetadata, payload: impl Into<Bytes>) -> Self {
        Self {
            position,
            key: -1,
            timestamp: 0,
            metadata,
            payload: payload.into(),
        }
    }

    /// Set the entity key
    #[must_use]
    pub fn with_key(mut self, key: i64) -> Self {
        self.key = key;
        self
    }

    /// Set the commit timestamp (milliseconds)
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.position
    }

    #[inline]
    pub fn key(&self) -> i64 {
        self.key
    }

    #[inline]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    #[inline]
    pub fn metadata(&self) -> RecordMetadata {
        self.metadata
    }

    #[inline]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }
}
