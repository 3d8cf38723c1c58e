//! TypedRecord - the decoded view of a log entry
//!
//! A record is decoded once per log position and then shared (behind an
//! `Arc`) by every sink that receives it.

use serde_json::{Map, Value};

use crate::Position;
use crate::entry::{LogEntry, RecordMetadata};
use crate::error::ProtocolError;
use crate::schema::{RecordKind, ValueKind};

/// Decoded, strongly-typed record
#[derive(Debug, Clone, PartialEq)]
pub struct TypedRecord {
    position: Position,
    key: i64,
    timestamp: i64,
    metadata: RecordMetadata,
    value: Map<String, Value>,
}

impl TypedRecord {
    /// Decode a log entry
    ///
    /// Returns `Ok(None)` when the entry's value kind is not one this build
    /// knows; such entries are not exportable and are only skipped over.
    /// Returns an error when the payload of a known value kind is malformed.
    pub fn decode(entry: &LogEntry) -> Result<Option<Self>, ProtocolError> {
        let metadata = entry.metadata();
        if !metadata.value_kind().is_known() {
            return Ok(None);
        }

        let value = if entry.payload().is_empty() {
            Map::new()
        } else {
            match serde_json::from_slice::<Value>(entry.payload()) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    return Err(ProtocolError::NotAnObject {
                        position: entry.position(),
                    });
                }
                Err(e) => return Err(ProtocolError::invalid_payload(entry.position(), e)),
            }
        };

        Ok(Some(Self {
            position: entry.position(),
            key: entry.key(),
            timestamp: entry.timestamp(),
            metadata,
            value,
        }))
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
    pub fn record_kind(&self) -> RecordKind {
        self.metadata.record_kind()
    }

    #[inline]
    pub fn value_kind(&self) -> ValueKind {
        self.metadata.value_kind()
    }

    /// The decoded record value
    #[inline]
    pub fn value(&self) -> &Map<String, Value> {
        &self.value
    }

    /// Look up a single field of the value
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.value.get(name)
    }

    /// Serialize the value back to compact JSON
    pub fn value_json(&self) -> String {
        Value::Object(self.value.clone()).to_string()
    }
}
