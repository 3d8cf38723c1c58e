//! Configured sinks
//!
//! Turns the `[sinks]` configuration section into descriptors through a
//! [`SinkRegistry`], in delivery order.

use exporter_config::SinksConfig;
use exporter_routing::SinkId;
use exporter_sinks::{SinkDescriptor, SinkRegistry};

use crate::error::{PipelineError, Result};

/// A sink to enable when the director starts
#[derive(Debug, Clone)]
pub struct ConfiguredSink {
    pub descriptor: SinkDescriptor,
    /// Sibling whose state seeds this sink when it has none
    pub init_from: Option<SinkId>,
}

impl ConfiguredSink {
    pub fn new(descriptor: SinkDescriptor) -> Self {
        Self {
            descriptor,
            init_from: None,
        }
    }

    #[must_use]
    pub fn init_from(mut self, sibling: SinkId) -> Self {
        self.init_from = Some(sibling);
        self
    }
}

/// Resolve every configured sink against the registry
///
/// # Errors
///
/// Returns [`PipelineError::Config`] for an invalid id, an unknown sink
/// type or unknown kind names.
pub fn configured_sinks(
    sinks: &SinksConfig,
    registry: &SinkRegistry,
) -> Result<Vec<ConfiguredSink>> {
    sinks
        .iter()
        .map(|(name, config)| {
            let id = SinkId::new(name).map_err(|e| PipelineError::config(name, e.to_string()))?;
            let filter = config
                .filter()
                .map_err(|e| PipelineError::config(name, e.to_string()))?;
            let descriptor = registry
                .descriptor(id, &config.sink_type)
                .map_err(|e| PipelineError::config(name, e.to_string()))?
                .with_config(config.options.clone())
                .with_filter(filter)
                .with_metadata_version(config.metadata_version);

            let init_from = config
                .init_from
                .as_deref()
                .map(SinkId::new)
                .transpose()
                .map_err(|e| PipelineError::config(name, e.to_string()))?;

            Ok(ConfiguredSink {
                descriptor,
                init_from,
            })
        })
        .collect()
}
