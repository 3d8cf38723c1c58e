//! Distributed state wire message
//!
//! A batch of (sink id, position, metadata) tuples taken from the leader's
//! position store. Uses a length-prefixed big-endian binary format so the
//! message can travel over any transport.
//!
//! # Wire Format
//!
//! ```text
//! ┌─────────────┬─────────┬──────────────┬─────────────┬─────────────┐
//! │ 4 bytes     │ 1 byte  │ 4 bytes      │ 4 bytes     │ entries...  │
//! │ length (BE) │ version │ partition id │ entry count │             │
//! └─────────────┴─────────┴──────────────┴─────────────┴─────────────┘
//!
//! entry: u16 id length | id (UTF-8) | i64 position | u32 metadata length | metadata
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use exporter_protocol::{PartitionId, Position};
use exporter_routing::SinkId;

use crate::error::{DistributionError, Result};

/// Current wire format version
const WIRE_VERSION: u8 = 1;

/// One sink's exported progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkStateEntry {
    pub sink_id: SinkId,
    pub position: Position,
    pub metadata: Bytes,
}

impl SinkStateEntry {
    pub fn new(sink_id: SinkId, position: Position, metadata: Bytes) -> Self {
        Self {
            sink_id,
            position,
            metadata,
        }
    }
}

/// Batch of sink states published by a partition leader
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DistributedState {
    pub partition_id: PartitionId,
    pub entries: Vec<SinkStateEntry>,
}

impl DistributedState {
    pub fn new(partition_id: PartitionId) -> Self {
        Self {
            partition_id,
            entries: Vec::new(),
        }
    }

    /// Add one sink's state
    pub fn push(&mut self, sink_id: SinkId, position: Position, metadata: Bytes) {
        self.entries
            .push(SinkStateEntry::new(sink_id, position, metadata));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode message to bytes with length prefix
    pub fn encode(&self) -> Bytes {
        let capacity = 13
            + self
                .entries
                .iter()
                .map(|e| 14 + e.sink_id.as_str().len() + e.metadata.len())
                .sum::<usize>();
        let mut buf = BytesMut::with_capacity(capacity);

        // Reserve space for length prefix (filled in at end)
        buf.put_u32(0);
        buf.put_u8(WIRE_VERSION);
        buf.put_u32(self.partition_id);
        buf.put_u32(self.entries.len() as u32);

        for entry in &self.entries {
            let id = entry.sink_id.as_str().as_bytes();
            buf.put_u16(id.len() as u16);
            buf.put_slice(id);
            buf.put_i64(entry.position);
            buf.put_u32(entry.metadata.len() as u32);
            buf.put_slice(&entry.metadata);
        }

        // Write length prefix (excluding the 4-byte length field itself)
        let len = (buf.len() - 4) as u32;
        buf[0..4].copy_from_slice(&len.to_be_bytes());

        buf.freeze()
    }

    /// Decode message from bytes (without length prefix)
    pub fn decode(mut buf: Bytes) -> Result<Self> {
        if buf.remaining() < 9 {
            return Err(DistributionError::protocol("truncated header"));
        }

        let version = buf.get_u8();
        if version != WIRE_VERSION {
            return Err(DistributionError::protocol(format!(
                "unsupported version: {version}"
            )));
        }

        let partition_id = buf.get_u32();
        let count = buf.get_u32() as usize;

        // Every entry needs at least 14 bytes; reject absurd counts early
        if buf.remaining() < count.saturating_mul(14) {
            return Err(DistributionError::protocol("truncated entries"));
        }

        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            entries.push(decode_entry(&mut buf)?);
        }

        if buf.has_remaining() {
            return Err(DistributionError::protocol(format!(
                "{} trailing bytes",
                buf.remaining()
            )));
        }

        Ok(Self {
            partition_id,
            entries,
        })
    }

    /// Decode a frame that still carries its length prefix
    pub fn decode_frame(mut frame: Bytes) -> Result<Self> {
        let len = read_length_prefix(&frame)
            .ok_or_else(|| DistributionError::protocol("truncated length prefix"))?;
        frame.advance(4);
        if frame.len() != len as usize {
            return Err(DistributionError::protocol(format!(
                "length prefix {len} does not match payload of {} bytes",
                frame.len()
            )));
        }
        Self::decode(frame)
    }
}

fn decode_entry(buf: &mut Bytes) -> Result<SinkStateEntry> {
    if buf.remaining() < 2 {
        return Err(DistributionError::protocol("truncated sink id length"));
    }
    let id_len = buf.get_u16() as usize;
    if buf.remaining() < id_len {
        return Err(DistributionError::protocol("truncated sink id"));
    }
    let id_bytes = buf.split_to(id_len);
    let id = std::str::from_utf8(&id_bytes)
        .map_err(|e| DistributionError::protocol(format!("invalid UTF-8: {e}")))?;
    let sink_id = SinkId::new(id).map_err(|e| DistributionError::protocol(e.to_string()))?;

    if buf.remaining() < 12 {
        return Err(DistributionError::protocol("truncated position"));
    }
    let position = buf.get_i64();
    let metadata_len = buf.get_u32() as usize;
    if buf.remaining() < metadata_len {
        return Err(DistributionError::protocol("truncated metadata"));
    }
    let metadata = buf.split_to(metadata_len);

    Ok(SinkStateEntry {
        sink_id,
        position,
        metadata,
    })
}

/// Read exactly 4 bytes for length prefix
pub fn read_length_prefix(buf: &[u8]) -> Option<u32> {
    if buf.len() < 4 {
        return None;
    }
    Some(u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]))
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
