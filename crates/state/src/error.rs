//! Position store error types

use thiserror::Error;

/// Result type for position store operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors produced by [`PositionStore`](crate::PositionStore) operations
#[derive(Debug, Error)]
pub enum StateError {
    /// Underlying SQLite failure
    #[error("sqlite error during {operation}: {source}")]
    Sqlite {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// File-system failure (e.g. creating the database directory)
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored row cannot be interpreted
    #[error("corrupt position store entry '{sink_id}': {reason}")]
    Corrupt { sink_id: String, reason: String },
}

impl StateError {
    /// Wrap a SQLite error with the operation that failed
    #[inline]
    pub fn sqlite(operation: &'static str, source: rusqlite::Error) -> Self {
        Self::Sqlite { operation, source }
    }

    /// Create a Corrupt error
    #[inline]
    pub fn corrupt(sink_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            sink_id: sink_id.into(),
            reason: reason.into(),
        }
    }
}
