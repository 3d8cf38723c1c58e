//! Export Pipeline - Routing
//!
//! Decides which sinks receive which entries.
//!
//! - `SinkId` - string identifier of a configured sink
//! - `RecordFilter` - accept predicate over (record kind, value kind)
//!
//! # Design
//!
//! Filters only look at the fixed entry header, never the payload, so the
//! director can reject an entry for every sink without decoding it. The
//! director keeps the union of all container filters and rebuilds it when
//! the sink set changes.
//!
//! # Example
//!
//! ```
//! use exporter_protocol::{RecordKind, RecordMetadata, ValueKind};
//! use exporter_routing::RecordFilter;
//!
//! let jobs = RecordFilter::new([RecordKind::Event], [ValueKind::Job]);
//! let timers = RecordFilter::new([RecordKind::Event], [ValueKind::Timer]);
//! let global = RecordFilter::union_all([&jobs, &timers]);
//!
//! assert!(global.accepts(&RecordMetadata::new(RecordKind::Event, ValueKind::Timer)));
//! assert!(!global.accepts(&RecordMetadata::new(RecordKind::Command, ValueKind::Job)));
//! ```

mod error;
mod filter;
mod sink_id;

pub use error::{Result, RoutingError};
pub use filter::RecordFilter;
pub use sink_id::{MAX_SINK_ID_LEN, SinkId};
