//! Record filters
//!
//! A filter decides from the fixed entry header alone whether a sink wants
//! an entry, so rejected entries are never decoded.
//!
//! Filters are stored as one value-kind bitmask per record kind. The union
//! of several filters is a bitwise OR per row, which accepts exactly the
//! (record kind, value kind) pairs at least one of the filters accepts.

use exporter_protocol::{RecordKind, RecordMetadata, ValueKind};

use crate::error::Result;

/// Number of rows: one per record kind wire value, including `Unknown`
const ROWS: usize = 4;

/// Accept predicate over (record kind, value kind)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordFilter {
    rows: [u32; ROWS],
}

impl RecordFilter {
    /// Filter that accepts every known record and value kind
    #[must_use]
    pub fn accept_all() -> Self {
        Self::new(RecordKind::ALL, ValueKind::ALL)
    }

    /// Filter that accepts nothing
    #[inline]
    #[must_use]
    pub const fn accept_none() -> Self {
        Self { rows: [0; ROWS] }
    }

    /// Filter accepting the cross product of the given kinds
    ///
    /// `Unknown` kinds are ignored; entries of unknown kind are never
    /// exportable.
    #[must_use]
    pub fn new(
        record_kinds: impl IntoIterator<Item = RecordKind>,
        value_kinds: impl IntoIterator<Item = ValueKind>,
    ) -> Self {
        let mask = value_kinds
            .into_iter()
            .filter(|kind| kind.is_known())
            .fold(0u32, |mask, kind| mask | bit(kind));

        let mut rows = [0; ROWS];
        for kind in record_kinds {
            if kind != RecordKind::Unknown {
                rows[kind.as_u8() as usize] = mask;
            }
        }
        Self { rows }
    }

    /// Build a filter from configuration names
    ///
    /// An empty list means "all kinds" for that dimension.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::UnknownKind`](crate::RoutingError::UnknownKind)
    /// for a name that is not a record or value kind.
    pub fn from_names(
        record_kinds: &[impl AsRef<str>],
        value_kinds: &[impl AsRef<str>],
    ) -> Result<Self> {
        let records = if record_kinds.is_empty() {
            RecordKind::ALL.to_vec()
        } else {
            record_kinds
                .iter()
                .map(|name| name.as_ref().parse::<RecordKind>())
                .collect::<std::result::Result<Vec<_>, _>>()?
        };

        let values = if value_kinds.is_empty() {
            ValueKind::ALL.to_vec()
        } else {
            value_kinds
                .iter()
                .map(|name| name.as_ref().parse::<ValueKind>())
                .collect::<std::result::Result<Vec<_>, _>>()?
        };

        Ok(Self::new(records, values))
    }

    /// Check whether an entry with this header is accepted
    #[inline]
    pub fn accepts(&self, metadata: &RecordMetadata) -> bool {
        self.accepts_kinds(metadata.record_kind(), metadata.value_kind())
    }

    /// Check whether a (record kind, value kind) pair is accepted
    #[inline]
    pub fn accepts_kinds(&self, record_kind: RecordKind, value_kind: ValueKind) -> bool {
        value_kind.is_known() && self.rows[record_kind.as_u8() as usize] & bit(value_kind) != 0
    }

    /// Filter accepting everything either filter accepts
    #[must_use]
    pub fn union(mut self, other: &Self) -> Self {
        for (row, other) in self.rows.iter_mut().zip(other.rows.iter()) {
            *row |= other;
        }
        self
    }

    /// Union of many filters (accepts nothing when empty)
    pub fn union_all<'a>(filters: impl IntoIterator<Item = &'a RecordFilter>) -> Self {
        filters
            .into_iter()
            .fold(Self::accept_none(), |acc, filter| acc.union(filter))
    }

    /// Check if the filter accepts nothing
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| *row == 0)
    }
}

#[inline]
const fn bit(kind: ValueKind) -> u32 {
    1 << kind.as_u8()
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod filter_test;
