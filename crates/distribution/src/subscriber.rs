//! Subscriber management for state topics
//!
//! Each follower director subscribing to a partition topic gets a
//! `Subscriber` with its own bounded channel. The `SubscriberManager`
//! handles registration, removal, and fan-out.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::error::{DistributionError, Result};

/// Counter for generating unique subscriber IDs
static SUBSCRIBER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Maximum number of concurrent subscribers per topic
pub const MAX_SUBSCRIBERS: usize = 64;

/// Channel buffer size for subscriber frames
///
/// Small on purpose: a follower only needs the most recent state, and a
/// full queue drops the frame.
pub const CHANNEL_BUFFER_SIZE: usize = 16;

/// A single subscriber
#[derive(Debug)]
pub struct Subscriber {
    id: u64,
    sender: mpsc::Sender<Bytes>,
}

impl Subscriber {
    pub fn new(sender: mpsc::Sender<Bytes>) -> Self {
        Self {
            id: SUBSCRIBER_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            sender,
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Try to send a frame without waiting
    ///
    /// Returns false if the queue is full or the subscriber is gone.
    #[inline]
    pub fn try_send(&self, frame: Bytes) -> bool {
        self.sender.try_send(frame).is_ok()
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Manages all subscribers of one topic
#[derive(Debug, Default)]
pub struct SubscriberManager {
    subscribers: RwLock<Vec<Arc<Subscriber>>>,
}

impl SubscriberManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    ///
    /// Returns the subscriber ID and receiver channel
    pub fn subscribe(&self) -> Result<(u64, mpsc::Receiver<Bytes>)> {
        let mut subscribers = self.subscribers.write();

        if subscribers.len() >= MAX_SUBSCRIBERS {
            return Err(DistributionError::MaxSubscribers {
                max: MAX_SUBSCRIBERS,
            });
        }

        let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let subscriber = Arc::new(Subscriber::new(sender));
        let id = subscriber.id();
        subscribers.push(subscriber);

        Ok((id, receiver))
    }

    /// Unsubscribe by ID
    pub fn unsubscribe(&self, id: u64) -> Result<()> {
        let mut subscribers = self.subscribers.write();
        let original_len = subscribers.len();
        subscribers.retain(|s| s.id() != id);

        if subscribers.len() == original_len {
            return Err(DistributionError::SubscriberNotFound { id });
        }

        Ok(())
    }

    pub fn count(&self) -> usize {
        self.subscribers.read().len()
    }

    #[inline]
    pub fn has_subscribers(&self) -> bool {
        !self.subscribers.read().is_empty()
    }

    /// Broadcast a frame to every subscriber
    ///
    /// Returns the number of subscribers that received the frame
    pub fn broadcast(&self, frame: &Bytes) -> usize {
        let subscribers = self.subscribers.read();
        subscribers
            .iter()
            .filter(|subscriber| subscriber.try_send(frame.clone()))
            .count()
    }

    /// Remove subscribers whose receiver was dropped
    pub fn cleanup_disconnected(&self) -> usize {
        let mut subscribers = self.subscribers.write();
        let original_len = subscribers.len();
        subscribers.retain(|s| s.is_connected());
        original_len - subscribers.len()
    }

    /// Drop every subscriber; their receivers observe end of stream
    pub fn clear(&self) -> usize {
        let mut subscribers = self.subscribers.write();
        let count = subscribers.len();
        subscribers.clear();
        count
    }
}

#[cfg(test)]
#[path = "subscriber_test.rs"]
mod tests;
