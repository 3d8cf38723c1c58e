//! Director configuration
//!
//! Settings for the per-partition export director: which partition it
//! serves, whether it exports (leader) or only follows distributed state,
//! and the timing of retries and state distribution.

use std::time::Duration;

use serde::Deserialize;

/// Role of the director on this replica
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DirectorMode {
    /// Leader: reads the log, exports, distributes positions
    #[default]
    Active,
    /// Follower: applies distributed positions only
    Passive,
}

/// `[director]` section
///
/// All fields have defaults; only set what you want to change.
///
/// ```toml
/// [director]
/// partition_id = 1
/// mode = "passive"
/// distribution_interval_ms = 5000
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Partition served by this director
    pub partition_id: u32,

    /// Active (leader) or passive (follower)
    pub mode: DirectorMode,

    /// How often the leader distributes sink positions
    /// Default: 15000
    pub distribution_interval_ms: u64,

    /// First backoff after a failed export
    /// Default: 100
    pub retry_initial_backoff_ms: u64,

    /// Backoff ceiling
    /// Default: 10000
    pub retry_max_backoff_ms: u64,

    /// Backoff growth factor
    /// Default: 2.0
    pub retry_multiplier: f64,

    /// Fixed delay between attempts to decode a malformed entry
    /// Default: 1000
    pub decode_retry_delay_ms: u64,

    /// Capacity of the director's command queue
    /// Default: 256
    pub command_queue_size: usize,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            partition_id: 1,
            mode: DirectorMode::Active,
            distribution_interval_ms: 15_000,
            retry_initial_backoff_ms: 100,
            retry_max_backoff_ms: 10_000,
            retry_multiplier: 2.0,
            decode_retry_delay_ms: 1_000,
            command_queue_size: 256,
        }
    }
}

impl DirectorConfig {
    pub fn distribution_interval(&self) -> Duration {
        Duration::from_millis(self.distribution_interval_ms)
    }

    pub fn retry_initial_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_initial_backoff_ms)
    }

    pub fn retry_max_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_max_backoff_ms)
    }

    pub fn decode_retry_delay(&self) -> Duration {
        Duration::from_millis(self.decode_retry_delay_ms)
    }

    /// Whether this director exports records
    pub fn is_active(&self) -> bool {
        self.mode == DirectorMode::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DirectorConfig::default();
        assert!(config.is_active());
        assert_eq!(config.distribution_interval(), Duration::from_secs(15));
        assert_eq!(config.retry_initial_backoff(), Duration::from_millis(100));
        assert_eq!(config.retry_max_backoff(), Duration::from_secs(10));
        assert_eq!(config.decode_retry_delay(), Duration::from_secs(1));
        assert_eq!(config.command_queue_size, 256);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: DirectorConfig = toml::from_str(
            r#"
partition_id = 7
mode = "passive"
retry_multiplier = 1.5
"#,
        )
        .unwrap();
        assert_eq!(config.partition_id, 7);
        assert_eq!(config.mode, DirectorMode::Passive);
        assert!(!config.is_active());
        assert_eq!(config.retry_multiplier, 1.5);
        assert_eq!(config.retry_max_backoff_ms, 10_000);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(toml::from_str::<DirectorConfig>(r#"mode = "standby""#).is_err());
    }
}
