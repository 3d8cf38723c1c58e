//! Sink configuration types
//!
//! Sinks are named instances keyed by their sink id. Each entry names the
//! sink `type` (resolved through the sink registry), an optional accept
//! filter, a metadata schema version, and an optional sibling to clone the
//! initial position from. Every other key is passed to the sink as its own
//! configuration table.
//!
//! ```toml
//! [sinks.search]
//! type = "null"
//!
//! [sinks.audit]
//! type = "stdout"
//! record_kinds = ["event"]
//! value_kinds = ["job", "process_instance"]
//! metadata_version = 1
//! init_from = "search"
//! color = false
//! ```

use std::collections::BTreeMap;

use exporter_routing::{RecordFilter, RoutingError};
use serde::Deserialize;

/// All configured sinks, ordered by id
///
/// The order is the delivery order of the director.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SinksConfig {
    #[serde(flatten)]
    sinks: BTreeMap<String, SinkConfig>,
}

impl SinksConfig {
    /// Get a sink by id
    pub fn get(&self, id: &str) -> Option<&SinkConfig> {
        self.sinks.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sinks.contains_key(id)
    }

    /// Iterate in id order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SinkConfig)> {
        self.sinks.iter()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.sinks.keys()
    }
}

/// Configuration for a single sink instance
#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    /// Registered sink type (`null`, `stdout`, ...)
    #[serde(rename = "type")]
    pub sink_type: String,

    /// Accepted record kinds; empty means all
    #[serde(default)]
    pub record_kinds: Vec<String>,

    /// Accepted value kinds; empty means all
    #[serde(default)]
    pub value_kinds: Vec<String>,

    /// Schema version of the metadata this sink persists
    #[serde(default)]
    pub metadata_version: u32,

    /// Sibling sink whose state seeds this one when first enabled
    #[serde(default)]
    pub init_from: Option<String>,

    /// Sink-specific options
    #[serde(flatten)]
    pub options: toml::Table,
}

impl SinkConfig {
    /// Build the accept filter from the configured kind names
    pub fn filter(&self) -> Result<RecordFilter, RoutingError> {
        RecordFilter::from_names(&self.record_kinds, &self.value_kinds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exporter_routing::RecordFilter;

    #[test]
    fn test_options_are_collected() {
        let config: SinksConfig = toml::from_str(
            r#"
[audit]
type = "stdout"
color = false
max_payload = 40
"#,
        )
        .unwrap();

        let audit = config.get("audit").unwrap();
        assert_eq!(audit.sink_type, "stdout");
        assert_eq!(audit.options.get("color"), Some(&toml::Value::Boolean(false)));
        assert_eq!(
            audit.options.get("max_payload"),
            Some(&toml::Value::Integer(40))
        );
        assert!(!audit.options.contains_key("type"));
        assert!(audit.init_from.is_none());
        assert_eq!(audit.metadata_version, 0);
    }

    #[test]
    fn test_iteration_is_ordered_by_id() {
        let config: SinksConfig = toml::from_str(
            r#"
[zeta]
type = "null"

[alpha]
type = "null"

[mid]
type = "null"
"#,
        )
        .unwrap();
        let names: Vec<_> = config.names().map(String::as_str).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_filter_from_kinds() {
        let config: SinksConfig = toml::from_str(
            r#"
[jobs]
type = "null"
record_kinds = ["event"]
value_kinds = ["job"]

[everything]
type = "null"
"#,
        )
        .unwrap();

        let jobs = config.get("jobs").unwrap().filter().unwrap();
        assert_ne!(jobs, RecordFilter::accept_all());
        assert_eq!(
            config.get("everything").unwrap().filter().unwrap(),
            RecordFilter::accept_all()
        );
    }

    #[test]
    fn test_missing_type_rejected() {
        assert!(toml::from_str::<SinksConfig>("[audit]\ncolor = true").is_err());
    }
}
