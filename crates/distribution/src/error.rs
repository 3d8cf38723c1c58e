//! Error types for the distribution crate

use thiserror::Error;

/// Errors that can occur while distributing sink state
#[derive(Error, Debug)]
pub enum DistributionError {
    /// Malformed wire message
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Maximum subscribers reached
    #[error("maximum subscribers reached ({max})")]
    MaxSubscribers { max: usize },

    /// Subscriber not found
    #[error("subscriber not found: {id}")]
    SubscriberNotFound { id: u64 },

    /// Topic was closed
    #[error("topic for partition {partition_id} is closed")]
    Closed { partition_id: u32 },
}

impl DistributionError {
    #[inline]
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }
}

/// Result type for distribution operations
pub type Result<T> = std::result::Result<T, DistributionError>;
