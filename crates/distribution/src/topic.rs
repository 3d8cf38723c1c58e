//! StateTopic - partition-scoped publish/subscribe of sink state
//!
//! The leader of a partition publishes its position store contents at a
//! fixed interval; followers apply what they receive. Delivery is best
//! effort: there are no acknowledgements, and a frame for a subscriber
//! whose queue is full is dropped. Correctness never depends on a frame
//! arriving, because the next publication carries the complete state.
//!
//! Frames travel encoded, exactly as they would over a network transport,
//! and are decoded by the receiving [`StateSubscription`].
//!
//! # Usage
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use bytes::Bytes;
//! use exporter_distribution::{DistributedState, StateTopic};
//! use exporter_routing::SinkId;
//!
//! let topic = StateTopic::new(1);
//! let mut subscription = topic.subscribe().unwrap();
//!
//! let mut state = DistributedState::new(1);
//! state.push(SinkId::new("audit").unwrap(), 50, Bytes::new());
//! assert_eq!(topic.distribute(&state), 1);
//!
//! assert_eq!(subscription.recv().await, Some(state));
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use exporter_protocol::PartitionId;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::error::{DistributionError, Result};
use crate::message::DistributedState;
use crate::subscriber::SubscriberManager;

/// Interval for cleanup of disconnected subscribers
const CLEANUP_INTERVAL: Duration = Duration::from_secs(5);

/// Publish/subscribe channel for one partition
#[derive(Debug)]
pub struct StateTopic {
    partition_id: PartitionId,
    subscribers: SubscriberManager,
    closed: AtomicBool,
    /// Total publications
    distributed_count: AtomicU64,
    /// Total frames handed to subscribers
    delivered_count: AtomicU64,
    /// Total frames dropped because a subscriber's queue was full
    dropped_count: AtomicU64,
}

impl StateTopic {
    pub fn new(partition_id: PartitionId) -> Self {
        Self {
            partition_id,
            subscribers: SubscriberManager::new(),
            closed: AtomicBool::new(false),
            distributed_count: AtomicU64::new(0),
            delivered_count: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn partition_id(&self) -> PartitionId {
        self.partition_id
    }

    /// Publish a state batch to every subscriber
    ///
    /// Returns the number of subscribers that received it. A no-op once the
    /// topic is closed.
    pub fn distribute(&self, state: &DistributedState) -> usize {
        if self.is_closed() {
            return 0;
        }

        self.distributed_count.fetch_add(1, Ordering::Relaxed);
        if !self.subscribers.has_subscribers() {
            return 0;
        }

        let frame = state.encode();
        let subscribers = self.subscribers.count();
        let sent = self.subscribers.broadcast(&frame);

        self.delivered_count
            .fetch_add(sent as u64, Ordering::Relaxed);
        let dropped = subscribers.saturating_sub(sent);
        if dropped > 0 {
            self.dropped_count
                .fetch_add(dropped as u64, Ordering::Relaxed);
        }
        trace!(
            partition = self.partition_id,
            entries = state.len(),
            sent,
            dropped,
            "distributed sink state"
        );
        sent
    }

    /// Subscribe to the topic
    pub fn subscribe(&self) -> Result<StateSubscription> {
        if self.is_closed() {
            return Err(DistributionError::Closed {
                partition_id: self.partition_id,
            });
        }
        let (id, receiver) = self.subscribers.subscribe()?;
        debug!(partition = self.partition_id, id, "new state subscriber");
        Ok(StateSubscription {
            id,
            partition_id: self.partition_id,
            receiver,
        })
    }

    /// Remove a subscriber
    pub fn unsubscribe(&self, id: u64) -> Result<()> {
        self.subscribers.unsubscribe(id)?;
        debug!(partition = self.partition_id, id, "state subscriber removed");
        Ok(())
    }

    /// Close the topic and end every subscription
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::Relaxed) {
            return;
        }
        let removed = self.subscribers.clear();
        debug!(partition = self.partition_id, removed, "state topic closed");
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.count()
    }

    /// Get topic statistics
    pub fn stats(&self) -> TopicStats {
        TopicStats {
            distributed_count: self.distributed_count.load(Ordering::Relaxed),
            delivered_count: self.delivered_count.load(Ordering::Relaxed),
            dropped_count: self.dropped_count.load(Ordering::Relaxed),
            subscriber_count: self.subscribers.count(),
        }
    }

    /// Remove subscribers whose subscription was dropped
    pub fn cleanup(&self) -> usize {
        let removed = self.subscribers.cleanup_disconnected();
        if removed > 0 {
            debug!(
                partition = self.partition_id,
                removed, "cleaned up disconnected subscribers"
            );
        }
        removed
    }

    /// Spawn the maintenance task
    ///
    /// Prunes dropped subscriptions every few seconds until the topic closes.
    pub fn spawn_maintenance(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let topic = Arc::clone(self);

        tokio::spawn(async move {
            let mut cleanup_interval = tokio::time::interval(CLEANUP_INTERVAL);
            while !topic.is_closed() {
                cleanup_interval.tick().await;
                topic.cleanup();
            }
        })
    }
}

/// Statistics about a topic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TopicStats {
    /// Total publications
    pub distributed_count: u64,
    /// Total frames handed to subscribers
    pub delivered_count: u64,
    /// Frames dropped because a subscriber's queue was full
    pub dropped_count: u64,
    /// Current number of subscribers
    pub subscriber_count: usize,
}

/// Receiving end of a topic subscription
#[derive(Debug)]
pub struct StateSubscription {
    id: u64,
    partition_id: PartitionId,
    receiver: mpsc::Receiver<Bytes>,
}

impl StateSubscription {
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Receive the next state batch
    ///
    /// Malformed frames and frames for another partition are logged and
    /// skipped. Returns `None` once the topic is closed or this subscriber
    /// was removed.
    pub async fn recv(&mut self) -> Option<DistributedState> {
        loop {
            let frame = self.receiver.recv().await?;
            match DistributedState::decode_frame(frame) {
                Ok(state) if state.partition_id == self.partition_id => return Some(state),
                Ok(state) => warn!(
                    partition = self.partition_id,
                    received = state.partition_id,
                    "ignoring state for another partition"
                ),
                Err(e) => warn!(
                    partition = self.partition_id,
                    error = %e,
                    "ignoring malformed state frame"
                ),
            }
        }
    }
}

#[cfg(test)]
#[path = "topic_test.rs"]
mod tests;
