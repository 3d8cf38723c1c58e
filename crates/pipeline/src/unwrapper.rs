//! Record unwrapper
//!
//! Decodes a log entry once and delivers the shared record to the sink
//! containers in order. When a container asks for a retry, delivery stops
//! there and the next attempt resumes at that container, so containers that
//! already took the record are not called again.

use std::sync::Arc;

use exporter_protocol::{LogEntry, Position, ProtocolError, TypedRecord};

use crate::container::{Delivery, SinkContainer};
use crate::error::Result;

#[derive(Debug, Default)]
pub struct RecordUnwrapper {
    record: Option<Arc<TypedRecord>>,
    next_index: usize,
}

impl RecordUnwrapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `entry` and make it the record to deliver
    ///
    /// Returns `Ok(false)` when the entry is of a kind this build cannot
    /// export; nothing is wrapped then. A malformed payload is an error and
    /// leaves nothing wrapped.
    pub fn wrap(&mut self, entry: &LogEntry) -> std::result::Result<bool, ProtocolError> {
        self.clear();
        match TypedRecord::decode(entry)? {
            Some(record) => {
                self.record = Some(Arc::new(record));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The wrapped record, if any
    pub fn record(&self) -> Option<&Arc<TypedRecord>> {
        self.record.as_ref()
    }

    /// Position of the wrapped record
    pub fn position(&self) -> Option<Position> {
        self.record.as_ref().map(|record| record.position())
    }

    #[inline]
    pub fn has_record(&self) -> bool {
        self.record.is_some()
    }

    /// Index of the container the next attempt starts at
    #[inline]
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Deliver the wrapped record, resuming where the last attempt stopped
    ///
    /// Returns `Ok(true)` once every container took the record (or when
    /// nothing is wrapped) and `Ok(false)` at the first container that asks
    /// for a retry.
    pub fn export(&mut self, containers: &mut [SinkContainer]) -> Result<bool> {
        let Some(record) = self.record.as_ref() else {
            return Ok(true);
        };

        while let Some(container) = containers.get_mut(self.next_index) {
            match container.export_record(record)? {
                Delivery::Done => self.next_index += 1,
                Delivery::Retry => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Start the next attempt at the first container
    ///
    /// Needed whenever the container list changes.
    pub fn reset_index(&mut self) {
        self.next_index = 0;
    }

    /// Drop the wrapped record
    pub fn clear(&mut self) {
        self.record = None;
        self.next_index = 0;
    }
}

#[cfg(test)]
#[path = "unwrapper_test.rs"]
mod unwrapper_test;
