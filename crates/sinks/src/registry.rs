//! Sink registry
//!
//! Maps the `type` of a configured sink to a factory, so configuration can
//! be turned into [`SinkDescriptor`]s. The built-in registry knows the
//! `null` and `stdout` sinks; embedders register their own types.

use std::collections::HashMap;
use std::sync::Arc;

use exporter_routing::SinkId;

use crate::common::SinkError;
use crate::descriptor::{SinkDescriptor, SinkFactory};
use crate::null::NullSink;
use crate::sink::Sink;
use crate::stdout::StdoutSink;

/// Registry of sink factories keyed by type name
#[derive(Clone, Default)]
pub struct SinkRegistry {
    factories: HashMap<String, SinkFactory>,
}

impl SinkRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in sinks
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("null", || Box::new(NullSink::new()) as Box<dyn Sink>);
        registry.register("stdout", || Box::new(StdoutSink::new()) as Box<dyn Sink>);
        registry
    }

    /// Register a factory, replacing any previous one for the type
    pub fn register<F>(&mut self, sink_type: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Sink> + Send + Sync + 'static,
    {
        self.factories.insert(sink_type.into(), Arc::new(factory));
    }

    #[inline]
    pub fn contains(&self, sink_type: &str) -> bool {
        self.factories.contains_key(sink_type)
    }

    /// Registered type names, sorted
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Build a descriptor for a sink of the given type
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::UnknownType`] if no factory is registered.
    pub fn descriptor(&self, id: SinkId, sink_type: &str) -> Result<SinkDescriptor, SinkError> {
        let factory = self
            .factories
            .get(sink_type)
            .ok_or_else(|| SinkError::UnknownType(sink_type.to_string()))?;
        Ok(SinkDescriptor::from_factory(id, Arc::clone(factory)).with_type(sink_type))
    }
}

impl std::fmt::Debug for SinkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkRegistry")
            .field("types", &self.types())
            .finish()
    }
}
