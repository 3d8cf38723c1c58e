//! Protocol error types
//!
//! Errors that can occur when decoding log entries or appending to a log.

use thiserror::Error;

use crate::Position;

/// Errors that can occur during protocol operations
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Payload is not a valid JSON document
    #[error("invalid payload at position {position}: {source}")]
    InvalidPayload {
        position: Position,
        #[source]
        source: serde_json::Error,
    },

    /// Payload decoded, but is not a JSON object
    #[error("payload at position {position} is not an object")]
    NotAnObject { position: Position },

    /// Appended entry does not advance the log
    #[error("position {position} does not follow last position {last}")]
    PositionNotIncreasing { position: Position, last: Position },

    /// Unknown record or value kind name
    #[error("unknown {kind} name: {name}")]
    UnknownKindName { kind: &'static str, name: String },
}

impl ProtocolError {
    /// Create an invalid payload error
    #[inline]
    pub fn invalid_payload(position: Position, source: serde_json::Error) -> Self {
        Self::InvalidPayload { position, source }
    }

    /// Create a non-increasing position error
    #[inline]
    pub fn not_increasing(position: Position, last: Position) -> Self {
        Self::PositionNotIncreasing { position, last }
    }

    /// Create an unknown kind name error
    #[inline]
    pub fn unknown_kind(kind: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownKindName {
            kind,
            name: name.into(),
        }
    }

    /// Whether this error came from decoding an entry's payload
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::InvalidPayload { .. } | Self::NotAnObject { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_increasing_display() {
        let err = ProtocolError::not_increasing(10, 12);
        assert!(err.to_string().contains("10"));
        assert!(err.to_string().contains("12"));
        assert!(!err.is_decode_error());
    }

    #[test]
    fn test_invalid_payload_is_decode_error() {
        let source = serde_json::from_slice::<serde_json::Value>(b"{").unwrap_err();
        let err = ProtocolError::invalid_payload(7, source);
        assert!(err.is_decode_error());
        assert!(err.to_string().contains("position 7"));
    }

    #[test]
    fn test_unknown_kind_display() {
        let err = ProtocolError::unknown_kind("value kind", "widget");
        assert_eq!(err.to_string(), "unknown value kind name: widget");
    }
}
