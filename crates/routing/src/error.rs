//! Routing error types

use exporter_protocol::ProtocolError;
use thiserror::Error;

/// Result type for routing operations
pub type Result<T> = std::result::Result<T, RoutingError>;

/// Errors that can occur while building sink ids and filters
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Sink id is empty or contains whitespace
    #[error("invalid sink id '{id}': {reason}")]
    InvalidSinkId {
        /// The rejected id
        id: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Filter names a record or value kind that does not exist
    #[error("invalid filter: {0}")]
    UnknownKind(#[from] ProtocolError),
}

impl RoutingError {
    /// Create an InvalidSinkId error
    #[inline]
    pub fn invalid_sink_id(id: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidSinkId {
            id: id.into(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sink_id_error() {
        let err = RoutingError::invalid_sink_id("bad id", "contains whitespace");
        assert!(err.to_string().contains("bad id"));
        assert!(err.to_string().contains("whitespace"));
    }

    #[test]
    fn test_unknown_kind_error() {
        let err: RoutingError = ProtocolError::unknown_kind("value kind", "jobz").into();
        assert!(err.to_string().contains("jobz"));
        assert!(err.to_string().contains("invalid filter"));
    }
}
