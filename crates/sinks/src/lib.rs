//! Export Pipeline - Sinks
//!
//! The plugin contract every export destination implements, plus the
//! reference sinks shipped with the pipeline.
//!
//! # Architecture
//!
//! The director of a partition owns one container per sink and calls the
//! sink synchronously from its own task, one record at a time, in log
//! order. The sink acknowledges progress through its controller; the
//! minimum acknowledged position across all sinks bounds log truncation.
//!
//! ```text
//! [Director] --&TypedRecord--> [Sink] --update_position--> [Controller] --> [Position Store]
//! ```
//!
//! # Available Sinks
//!
//! | Sink | Purpose |
//! |------|---------|
//! | `null` | Benchmarking (acknowledge and discard) |
//! | `stdout` | Debug output |
//!
//! # Example
//!
//! ```
//! use exporter_routing::SinkId;
//! use exporter_sinks::SinkRegistry;
//!
//! let registry = SinkRegistry::with_builtin();
//! let descriptor = registry
//!     .descriptor(SinkId::new("debug").unwrap(), "stdout")
//!     .unwrap();
//! let _sink = descriptor.create_sink();
//! ```

/// Null sink - acknowledges and discards all records
pub mod null;

/// Stdout sink - human-readable debug output
pub mod stdout;

/// Shared utilities (rate-limited logging)
pub mod util;

mod common;
mod descriptor;
mod registry;
mod sink;

pub use common::{MetricsSnapshot, SinkError, SinkMetrics};
pub use descriptor::{SinkDescriptor, SinkFactory};
pub use null::{NullSink, NullSinkConfig};
pub use registry::SinkRegistry;
pub use sink::{ScheduledTask, Sink, SinkContext, SinkController, TaskHandle};
pub use stdout::{StdoutConfig, StdoutSink};
