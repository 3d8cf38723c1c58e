//! Common types and utilities for sinks
//!
//! Shared functionality across all sink types.

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

/// Metrics shared by all sink types
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Records handed to the sink
    pub records_received: AtomicU64,

    /// Records the sink wrote out
    pub records_exported: AtomicU64,

    /// Bytes written for exported records
    pub bytes_exported: AtomicU64,

    /// Export errors encountered
    pub export_errors: AtomicU64,

    /// Position acknowledgements sent to the controller
    pub acknowledgements: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            records_received: AtomicU64::new(0),
            records_exported: AtomicU64::new(0),
            bytes_exported: AtomicU64::new(0),
            export_errors: AtomicU64::new(0),
            acknowledgements: AtomicU64::new(0),
        }
    }

    /// Record a received record
    #[inline]
    pub fn record_received(&self) {
        self.records_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successfully exported record
    #[inline]
    pub fn record_exported(&self, bytes: u64) {
        self.records_exported.fetch_add(1, Ordering::Relaxed);
        self.bytes_exported.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record an export error
    #[inline]
    pub fn export_error(&self) {
        self.export_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an acknowledgement
    #[inline]
    pub fn acknowledged(&self) {
        self.acknowledgements.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_received: self.records_received.load(Ordering::Relaxed),
            records_exported: self.records_exported.load(Ordering::Relaxed),
            bytes_exported: self.bytes_exported.load(Ordering::Relaxed),
            export_errors: self.export_errors.load(Ordering::Relaxed),
            acknowledgements: self.acknowledgements.load(Ordering::Relaxed),
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.records_received.store(0, Ordering::Relaxed);
        self.records_exported.store(0, Ordering::Relaxed);
        self.bytes_exported.store(0, Ordering::Relaxed);
        self.export_errors.store(0, Ordering::Relaxed);
        self.acknowledgements.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time snapshot of sink metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_received: u64,
    pub records_exported: u64,
    pub bytes_exported: u64,
    pub export_errors: u64,
    pub acknowledgements: u64,
}

/// Common sink errors
///
/// Every variant except [`SinkError::Unrecoverable`] is retried by the
/// pipeline with backoff.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Sink initialization failed
    #[error("failed to initialize sink: {0}")]
    Init(String),

    /// Failed to write data
    #[error("write failed: {0}")]
    Write(String),

    /// Connection error (for network sinks)
    #[error("connection error: {0}")]
    Connection(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// No sink is registered for a configured type
    #[error("unknown sink type '{0}'")]
    UnknownType(String),

    /// The sink can never make progress; stops the partition's pipeline
    #[error("unrecoverable sink failure: {0}")]
    Unrecoverable(String),
}

impl SinkError {
    /// Create an initialization error
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Create a write error
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an unrecoverable error
    pub fn unrecoverable(msg: impl Into<String>) -> Self {
        Self::Unrecoverable(msg.into())
    }

    /// Whether the pipeline should retry the failed call
    #[inline]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Unrecoverable(_))
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod common_test;
