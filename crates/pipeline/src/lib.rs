//! Export Pipeline
//!
//! Per-partition export director: reads committed log entries and drives
//! the configured sinks, keeping one durable position per sink.
//!
//! # Architecture
//!
//! ```text
//!                          [ExportDirector task]
//! LogReader ──→ RecordFilter ──→ RecordUnwrapper ──→ SinkContainer ──→ Sink
//!    ↑          (union of all)    (decode once)      SinkContainer ──→ Sink
//!    │                                                   │
//!    └── seek(lowest + 1) ◄── PositionStore ◄── acknowledgements
//!                                  │
//!                                  └──→ StateTopic ──→ passive directors
//! ```
//!
//! # Key Design
//!
//! - **Single task**: one director per partition owns every container, so
//!   records reach sinks strictly in log order and never concurrently
//! - **At-least-once**: a sink's position only moves when the sink
//!   acknowledges; after a restart delivery resumes after the lowest
//!   position, and records a sink already acknowledged are skipped
//! - **Retry forever**: retryable sink failures back off exponentially and
//!   resume at the failing sink; unrecoverable ones fail the director
//! - **Skip path**: records no sink wants still advance idle sinks so a
//!   narrow filter never pins the log
//!
//! # Example
//!
//! ```ignore
//! use exporter_pipeline::{ExportDirector, configured_sinks};
//!
//! let sinks = configured_sinks(&config.sinks, &SinkRegistry::with_builtin())?;
//! let handle = ExportDirector::new(config.director.clone(), store, log, topic)
//!     .with_sinks(sinks)
//!     .spawn();
//!
//! handle.soft_pause().await;
//! handle.resume().await?;
//! handle.close().await;
//! ```

mod command;
mod configured;
mod container;
mod director;
mod error;
mod handle;
mod health;
mod metrics;
mod retry;
mod unwrapper;

#[cfg(test)]
mod testing;

pub use configured::{ConfiguredSink, configured_sinks};
pub use container::{Delivery, SinkContainer};
pub use director::ExportDirector;
pub use error::{PipelineError, Result};
pub use handle::ExportDirectorHandle;
pub use health::{DirectorPhase, FailureContext, FailureListener, HealthReport, HealthStatus};
pub use metrics::{DirectorMetrics, MetricsSnapshot};
pub use retry::RetryPolicy;
pub use unwrapper::RecordUnwrapper;

// Re-export key types from dependencies for convenience
pub use exporter_protocol::{LogStream, PartitionId, Position};
pub use exporter_routing::SinkId;
