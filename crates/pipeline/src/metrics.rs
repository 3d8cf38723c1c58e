//! Export director metrics
//!
//! Atomic counters updated by the director task and read from anywhere
//! through [`ExportDirectorHandle::metrics`](crate::ExportDirectorHandle::metrics).
//! All operations use relaxed ordering; values are eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one partition's director
#[derive(Debug, Default)]
pub struct DirectorMetrics {
    /// Entries read from the log
    records_read: AtomicU64,

    /// Records delivered to every sink that wanted them
    records_exported: AtomicU64,

    /// Entries no sink wanted (advanced through the skip path)
    records_skipped: AtomicU64,

    /// Export attempts a sink asked to retry
    export_failures: AtomicU64,

    /// Entries that could not be decoded
    decode_failures: AtomicU64,

    /// Backoff sleeps scheduled
    retries: AtomicU64,

    /// State batches broadcast by the leader
    distributions_sent: AtomicU64,

    /// Distributed sink positions applied by a follower
    distributions_applied: AtomicU64,
}

impl DirectorMetrics {
    #[inline]
    pub const fn new() -> Self {
        Self {
            records_read: AtomicU64::new(0),
            records_exported: AtomicU64::new(0),
            records_skipped: AtomicU64::new(0),
            export_failures: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            distributions_sent: AtomicU64::new(0),
            distributions_applied: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_read(&self) {
        self.records_read.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_exported(&self) {
        self.records_exported.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_skipped(&self) {
        self.records_skipped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_export_failure(&self) {
        self.export_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_distribution_sent(&self) {
        self.distributions_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_distribution_applied(&self, entries: u64) {
        self.distributions_applied
            .fetch_add(entries, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_read: self.records_read.load(Ordering::Relaxed),
            records_exported: self.records_exported.load(Ordering::Relaxed),
            records_skipped: self.records_skipped.load(Ordering::Relaxed),
            export_failures: self.export_failures.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            distributions_sent: self.distributions_sent.load(Ordering::Relaxed),
            distributions_applied: self.distributions_applied.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.records_read.store(0, Ordering::Relaxed);
        self.records_exported.store(0, Ordering::Relaxed);
        self.records_skipped.store(0, Ordering::Relaxed);
        self.export_failures.store(0, Ordering::Relaxed);
        self.decode_failures.store(0, Ordering::Relaxed);
        self.retries.store(0, Ordering::Relaxed);
        self.distributions_sent.store(0, Ordering::Relaxed);
        self.distributions_applied.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time snapshot of director metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub records_read: u64,
    pub records_exported: u64,
    pub records_skipped: u64,
    pub export_failures: u64,
    pub decode_failures: u64,
    pub retries: u64,
    pub distributions_sent: u64,
    pub distributions_applied: u64,
}

impl MetricsSnapshot {
    /// Difference from an earlier snapshot, for rates over an interval
    pub fn diff(&self, previous: &MetricsSnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            records_read: self.records_read.saturating_sub(previous.records_read),
            records_exported: self
                .records_exported
                .saturating_sub(previous.records_exported),
            records_skipped: self
                .records_skipped
                .saturating_sub(previous.records_skipped),
            export_failures: self
                .export_failures
                .saturating_sub(previous.export_failures),
            decode_failures: self
                .decode_failures
                .saturating_sub(previous.decode_failures),
            retries: self.retries.saturating_sub(previous.retries),
            distributions_sent: self
                .distributions_sent
                .saturating_sub(previous.distributions_sent),
            distributions_applied: self
                .distributions_applied
                .saturating_sub(previous.distributions_applied),
        }
    }
}
