//! DistributionHub - hands out state topics by partition
//!
//! Stands in for the cluster messaging layer when every replica of a
//! partition runs in one process: the leader's director and the followers'
//! directors obtain the same [`StateTopic`] for their partition id.

use std::collections::HashMap;
use std::sync::Arc;

use exporter_protocol::PartitionId;
use parking_lot::RwLock;

use crate::topic::StateTopic;

/// Registry of per-partition topics
#[derive(Debug, Default)]
pub struct DistributionHub {
    topics: RwLock<HashMap<PartitionId, Arc<StateTopic>>>,
}

impl DistributionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Topic of a partition, created on first use
    ///
    /// A closed topic is replaced by a fresh one.
    pub fn topic(&self, partition_id: PartitionId) -> Arc<StateTopic> {
        if let Some(topic) = self.topics.read().get(&partition_id)
            && !topic.is_closed()
        {
            return Arc::clone(topic);
        }

        let mut topics = self.topics.write();
        let topic = topics
            .entry(partition_id)
            .and_modify(|topic| {
                if topic.is_closed() {
                    *topic = Arc::new(StateTopic::new(partition_id));
                }
            })
            .or_insert_with(|| Arc::new(StateTopic::new(partition_id)));
        Arc::clone(topic)
    }

    /// Close and forget a partition's topic
    pub fn remove(&self, partition_id: PartitionId) -> bool {
        match self.topics.write().remove(&partition_id) {
            Some(topic) => {
                topic.close();
                true
            }
            None => false,
        }
    }

    /// Partitions with a topic, sorted
    pub fn partitions(&self) -> Vec<PartitionId> {
        let mut partitions: Vec<_> = self.topics.read().keys().copied().collect();
        partitions.sort_unstable();
        partitions
    }

    /// Close every topic
    pub fn close_all(&self) {
        for (_, topic) in self.topics.write().drain() {
            topic.close();
        }
    }
}
