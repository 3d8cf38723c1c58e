//! Sink identifier type
//!
//! `SinkId` is the string identifier a sink is configured under. It keys
//! the position store, the distributed state and the partition sink set.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Result, RoutingError};

/// Maximum length of a sink id in bytes
pub const MAX_SINK_ID_LEN: usize = 255;

/// Identifier of a configured sink
///
/// Backed by an `Arc<str>` so clones are a reference count bump; ids are
/// cloned into every container, acknowledgement and distributed tuple.
///
/// # Example
///
/// ```
/// use exporter_routing::SinkId;
///
/// let id = SinkId::new("elasticsearch").unwrap();
/// assert_eq!(id.as_str(), "elasticsearch");
/// assert!(SinkId::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(Arc<str>);

impl SinkId {
    /// Create a validated sink id
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::InvalidSinkId`] if the id is empty, longer
    /// than [`MAX_SINK_ID_LEN`] bytes or contains whitespace.
    pub fn new(id: impl AsRef<str>) -> Result<Self> {
        let id = id.as_ref();
        if id.is_empty() {
            return Err(RoutingError::invalid_sink_id(id, "must not be empty"));
        }
        if id.len() > MAX_SINK_ID_LEN {
            return Err(RoutingError::invalid_sink_id(id, "too long"));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(RoutingError::invalid_sink_id(id, "contains whitespace"));
        }
        Ok(Self(Arc::from(id)))
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SinkId {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for SinkId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SinkId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SinkId {
    type Error = RoutingError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for SinkId {
    type Error = RoutingError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}
