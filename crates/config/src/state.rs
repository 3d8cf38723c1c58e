//! Position store configuration

use std::path::PathBuf;

use serde::Deserialize;

/// `[state]` section
///
/// Without a `path` positions are kept in memory and lost on restart.
///
/// ```toml
/// [state]
/// path = "data/positions.db"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// SQLite database file
    pub path: Option<PathBuf>,
}

impl StateConfig {
    pub fn is_durable(&self) -> bool {
        self.path.is_some()
    }
}
