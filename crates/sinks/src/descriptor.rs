//! Sink descriptors
//!
//! A descriptor is everything needed to build a sink container: the id,
//! static configuration, filter, metadata version and a factory. It is
//! immutable once built and may be used to create the sink again after a
//! disable/enable cycle.

use std::fmt;
use std::sync::Arc;

use exporter_routing::{RecordFilter, SinkId};

use crate::sink::Sink;

/// Creates a fresh sink instance
pub type SinkFactory = Arc<dyn Fn() -> Box<dyn Sink> + Send + Sync>;

/// Static description of a configured sink
#[derive(Clone)]
pub struct SinkDescriptor {
    id: SinkId,
    sink_type: String,
    config: toml::Table,
    filter: RecordFilter,
    metadata_version: u32,
    factory: SinkFactory,
}

impl SinkDescriptor {
    /// Create a descriptor that accepts every record
    pub fn new<F>(id: SinkId, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Sink> + Send + Sync + 'static,
    {
        Self::from_factory(id, Arc::new(factory))
    }

    /// Create a descriptor from a shared factory
    pub fn from_factory(id: SinkId, factory: SinkFactory) -> Self {
        Self {
            id,
            sink_type: "custom".into(),
            config: toml::Table::new(),
            filter: RecordFilter::accept_all(),
            metadata_version: 0,
            factory,
        }
    }

    #[must_use]
    pub fn with_type(mut self, sink_type: impl Into<String>) -> Self {
        self.sink_type = sink_type.into();
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: toml::Table) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: RecordFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_metadata_version(mut self, version: u32) -> Self {
        self.metadata_version = version;
        self
    }

    #[inline]
    pub fn id(&self) -> &SinkId {
        &self.id
    }

    #[inline]
    pub fn sink_type(&self) -> &str {
        &self.sink_type
    }

    #[inline]
    pub fn config(&self) -> &toml::Table {
        &self.config
    }

    #[inline]
    pub fn filter(&self) -> &RecordFilter {
        &self.filter
    }

    #[inline]
    pub fn metadata_version(&self) -> u32 {
        self.metadata_version
    }

    /// Build a new sink instance
    pub fn create_sink(&self) -> Box<dyn Sink> {
        (self.factory)()
    }
}

impl fmt::Debug for SinkDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkDescriptor")
            .field("id", &self.id)
            .field("sink_type", &self.sink_type)
            .field("filter", &self.filter)
            .field("metadata_version", &self.metadata_version)
            .finish_non_exhaustive()
    }
}
