//! Rate-limited logging
//!
//! A sink that keeps failing is retried forever; logging every attempt
//! would flood the log. The logger emits at most one line per interval and
//! reports how many occurrences were suppressed in between.
//!
//! # Example
//!
//! ```
//! use exporter_sinks::util::RateLimitedLogger;
//! use std::time::Duration;
//!
//! let logger = RateLimitedLogger::new(Duration::from_secs(10));
//! let error = std::io::Error::other("connection refused");
//!
//! // Only the first call within the interval is logged
//! assert!(logger.warn("export failed", &error));
//! assert!(!logger.warn("export failed", &error));
//! ```

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default interval for rate-limited logging
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Rate-limited logger that prevents log spam
///
/// Thread-safe: uses atomic counters and a mutex for the last log time.
#[derive(Debug)]
pub struct RateLimitedLogger {
    /// Minimum interval between log messages
    min_interval: Duration,

    /// Last time we logged
    last_log_time: Mutex<Option<Instant>>,

    /// Occurrences since last log
    pending: AtomicU64,

    /// Total occurrences ever recorded
    total: AtomicU64,
}

impl RateLimitedLogger {
    /// Create a new rate-limited logger with the specified interval
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_log_time: Mutex::new(None),
            pending: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    /// Record a warning and log it if the interval has passed
    ///
    /// Returns true if the warning was logged, false if it was suppressed.
    pub fn warn(&self, message: &str, error: &dyn Display) -> bool {
        let Some((suppressed, total)) = self.should_log() else {
            return false;
        };
        tracing::warn!(
            error = %error,
            suppressed_count = suppressed,
            total_errors = total,
            "{message}"
        );
        true
    }

    /// Record an error and log it if the interval has passed
    ///
    /// Returns true if the error was logged, false if it was suppressed.
    pub fn error(&self, message: &str, error: &dyn Display) -> bool {
        let Some((suppressed, total)) = self.should_log() else {
            return false;
        };
        tracing::error!(
            error = %error,
            suppressed_count = suppressed,
            total_errors = total,
            "{message}"
        );
        true
    }

    /// Count an occurrence; returns (suppressed since last log, total)
    /// when this occurrence should be logged
    fn should_log(&self) -> Option<(u64, u64)> {
        self.pending.fetch_add(1, Ordering::Relaxed);
        let total = self.total.fetch_add(1, Ordering::Relaxed) + 1;

        {
            let mut last_time = self.last_log_time.lock();
            let now = Instant::now();
            match *last_time {
                Some(last) if now.duration_since(last) < self.min_interval => return None,
                _ => *last_time = Some(now),
            }
        }

        let count = self.pending.swap(0, Ordering::Relaxed);
        Some((count.saturating_sub(1), total))
    }

    /// Occurrences recorded since the last emitted line
    pub fn pending_count(&self) -> u64 {
        self.pending.load(Ordering::Relaxed)
    }

    /// Total occurrences recorded
    pub fn total_count(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.pending.store(0, Ordering::Relaxed);
        self.total.store(0, Ordering::Relaxed);
        *self.last_log_time.lock() = None;
    }
}

impl Default for RateLimitedLogger {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_INTERVAL)
    }
}
