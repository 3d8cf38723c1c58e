//! Configuration validation
//!
//! Validates config consistency:
//! - Sink ids are valid sink identifiers
//! - Every sink names a type
//! - Record and value kind names are known
//! - `init_from` refers to another configured sink
//! - Retry timing is sane and the command queue is not empty

use exporter_routing::SinkId;

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_director(config)?;
    validate_sinks(config)?;
    Ok(())
}

fn validate_director(config: &Config) -> Result<()> {
    let director = &config.director;
    let name = format!("partition {}", director.partition_id);

    if director.retry_initial_backoff_ms == 0 {
        return Err(ConfigError::invalid_value(
            "director",
            name,
            "retry_initial_backoff_ms",
            "must be greater than zero",
        ));
    }

    if director.retry_max_backoff_ms < director.retry_initial_backoff_ms {
        return Err(ConfigError::invalid_value(
            "director",
            name,
            "retry_max_backoff_ms",
            format!(
                "must be at least retry_initial_backoff_ms ({})",
                director.retry_initial_backoff_ms
            ),
        ));
    }

    if !director.retry_multiplier.is_finite() || director.retry_multiplier < 1.0 {
        return Err(ConfigError::invalid_value(
            "director",
            name,
            "retry_multiplier",
            "must be a finite number of at least 1.0",
        ));
    }

    if director.distribution_interval_ms == 0 {
        return Err(ConfigError::invalid_value(
            "director",
            name,
            "distribution_interval_ms",
            "must be greater than zero",
        ));
    }

    if director.command_queue_size == 0 {
        return Err(ConfigError::invalid_value(
            "director",
            name,
            "command_queue_size",
            "must be greater than zero",
        ));
    }

    Ok(())
}

fn validate_sinks(config: &Config) -> Result<()> {
    for (name, sink) in config.sinks.iter() {
        if let Err(e) = SinkId::new(name) {
            return Err(ConfigError::invalid_value("sink", name, "id", e.to_string()));
        }

        if sink.sink_type.is_empty() {
            return Err(ConfigError::missing_field("sink", name, "type"));
        }

        if let Err(e) = sink.filter() {
            return Err(ConfigError::invalid_value(
                "sink",
                name,
                "record_kinds/value_kinds",
                e.to_string(),
            ));
        }

        if let Some(ref init_from) = sink.init_from {
            if init_from == name {
                return Err(ConfigError::invalid_value(
                    "sink",
                    name,
                    "init_from",
                    "a sink cannot initialize from itself",
                ));
            }
            if !config.sinks.contains(init_from) {
                return Err(ConfigError::unknown_init_source(name, init_from));
            }
        }
    }

    Ok(())
}
