//! Export Pipeline - State Distribution
//!
//! Replicates export progress from a partition's leader to its followers so
//! a follower that takes over does not re-export acknowledged records.
//!
//! - [`DistributedState`] - batch of (sink id, position, metadata) tuples
//!   with a length-prefixed binary encoding
//! - [`StateTopic`] - best-effort partition-scoped publish/subscribe
//! - [`DistributionHub`] - topics by partition id
//!
//! # Architecture
//!
//! ```text
//! Leader director ── every interval ──→ StateTopic.distribute()
//!                                            │ (encoded frames)
//!                                  ┌─────────┴─────────┐
//!                                  ▼                   ▼
//!                         StateSubscription     StateSubscription
//!                                  │                   │
//!                           Follower director   Follower director
//!                                  │                   │
//!                           Position Store       Position Store
//! ```

mod error;
mod hub;
mod message;
mod subscriber;
mod topic;

pub use error::{DistributionError, Result};
pub use hub::DistributionHub;
pub use message::{DistributedState, SinkStateEntry, read_length_prefix};
pub use subscriber::{CHANNEL_BUFFER_SIZE, MAX_SUBSCRIBERS};
pub use topic::{StateSubscription, StateTopic, TopicStats};
