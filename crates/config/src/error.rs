//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Sink `init_from` names a sink that is not configured
    #[error("sink '{sink}' initializes from unknown sink '{init_from}'")]
    UnknownInitSource {
        /// Sink being initialized
        sink: String,
        /// Missing sibling
        init_from: String,
    },

    /// Validation error - required field missing
    #[error("{component} '{name}' is missing required field '{field}'")]
    MissingField {
        /// Component type (e.g., "sink", "director")
        component: &'static str,
        /// Name of the component
        name: String,
        /// Missing field name
        field: &'static str,
    },

    /// Validation error - invalid value
    #[error("{component} '{name}' has invalid {field}: {message}")]
    InvalidValue {
        /// Component type
        component: &'static str,
        /// Name of the component
        name: String,
        /// Field name
        field: &'static str,
        /// Error message
        message: String,
    },
}

impl ConfigError {
    /// Create an UnknownInitSource error
    pub fn unknown_init_source(sink: impl Into<String>, init_from: impl Into<String>) -> Self {
        Self::UnknownInitSource {
            sink: sink.into(),
            init_from: init_from.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(
        component: &'static str,
        name: impl Into<String>,
        field: &'static str,
    ) -> Self {
        Self::MissingField {
            component,
            name: name.into(),
            field,
        }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(
        component: &'static str,
        name: impl Into<String>,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            component,
            name: name.into(),
            field,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_init_source_error() {
        let err = ConfigError::unknown_init_source("audit", "search");
        assert!(err.to_string().contains("audit"));
        assert!(err.to_string().contains("unknown sink 'search'"));
    }

    #[test]
    fn test_missing_field_error() {
        let err = ConfigError::missing_field("sink", "audit", "type");
        assert!(err.to_string().contains("sink"));
        assert!(err.to_string().contains("audit"));
        assert!(err.to_string().contains("type"));
    }

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::invalid_value(
            "director",
            "partition 1",
            "retry_multiplier",
            "must be at least 1.0",
        );
        assert!(err.to_string().contains("partition 1"));
        assert!(err.to_string().contains("retry_multiplier"));
    }
}
