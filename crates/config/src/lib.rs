//! Export Pipeline - Configuration
//!
//! TOML-based configuration with sensible defaults. An empty file is a
//! valid configuration: an active director for partition 1, in-memory
//! positions and no sinks.
//!
//! # Parsing
//!
//! ```
//! use exporter_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[sinks.debug]\ntype = \"stdout\"").unwrap();
//! assert_eq!(config.sink_ids(), vec!["debug"]);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [log]
//! level = "info"
//!
//! [director]
//! partition_id = 1
//! mode = "active"
//!
//! [state]
//! path = "data/positions.db"
//!
//! [sinks.search]
//! type = "null"
//!
//! [sinks.audit]
//! type = "stdout"
//! record_kinds = ["event"]
//! init_from = "search"
//! ```

mod director;
mod error;
mod logging;
mod sinks;
mod state;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use director::{DirectorConfig, DirectorMode};
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use sinks::{SinkConfig, SinksConfig};
pub use state::StateConfig;

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging of the exporter binary
    pub log: LogConfig,

    /// Export director of this partition
    pub director: DirectorConfig,

    /// Position store
    pub state: StateConfig,

    /// Sinks keyed by sink id
    pub sinks: SinksConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, contains invalid TOML, or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Configured sink ids in delivery order
    pub fn sink_ids(&self) -> Vec<&str> {
        self.sinks.names().map(String::as_str).collect()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
