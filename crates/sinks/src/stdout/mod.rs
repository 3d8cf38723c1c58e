//! Stdout Sink - Human-readable debug output
//!
//! Prints one line per exported record and acknowledges it. Not intended
//! for production use at high throughput.
//!
//! # Example Output
//!
//! ```text
//! 07:34:59.161 p:1 debug event   job              #10 key:2251799813685249 {"type":"email"}
//! 07:34:59.162 p:1 debug command process_instance #11 key:2251799813685250 {}
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [sinks.debug]
//! type = "stdout"
//! color = false
//! max_payload = 200
//! ```

use std::io::Write;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use exporter_protocol::{PartitionId, RecordKind, TypedRecord};
use owo_colors::{OwoColorize, Style};
use serde::Deserialize;

use crate::common::{SinkError, SinkMetrics};
use crate::sink::{Sink, SinkContext, SinkController};

/// Configuration for stdout sink
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StdoutConfig {
    /// Enable colored output
    pub color: bool,

    /// Print the record value
    pub show_payload: bool,

    /// Truncate the printed value to this many bytes (0 = no limit)
    pub max_payload: usize,
}

impl Default for StdoutConfig {
    fn default() -> Self {
        Self {
            color: true,
            show_payload: true,
            max_payload: 120,
        }
    }
}

impl StdoutConfig {
    /// Create config with colors disabled (for piped output)
    pub fn no_color() -> Self {
        Self {
            color: false,
            ..Self::default()
        }
    }
}

// =============================================================================
// Color Styles
// =============================================================================

/// Color styles for terminal output
struct Styles {
    timestamp: Style,
    label: Style,
    payload: Style,
}

impl Styles {
    fn new(enabled: bool) -> Self {
        if enabled {
            Self {
                timestamp: Style::new().dimmed(),
                label: Style::new().dimmed(),
                payload: Style::new().dimmed(),
            }
        } else {
            Self {
                timestamp: Style::new(),
                label: Style::new(),
                payload: Style::new(),
            }
        }
    }
}

/// Get style for record kind
fn kind_style(kind: RecordKind, enabled: bool) -> Style {
    if !enabled {
        return Style::new();
    }
    match kind {
        RecordKind::Event => Style::new().green(),
        RecordKind::Command => Style::new().cyan(),
        RecordKind::CommandRejection => Style::new().red(),
        RecordKind::Unknown => Style::new().dimmed(),
    }
}

// =============================================================================
// StdoutSink Implementation
// =============================================================================

/// Stdout sink for debug output
pub struct StdoutSink {
    config: StdoutConfig,
    name: String,
    partition_id: PartitionId,
    out: Box<dyn Write + Send>,
    controller: Option<Arc<dyn SinkController>>,
    metrics: Arc<SinkMetrics>,
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl StdoutSink {
    /// Create a new stdout sink with default config
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    /// Create a sink printing to another writer
    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            config: StdoutConfig::default(),
            name: "stdout".into(),
            partition_id: 0,
            out,
            controller: None,
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    #[inline]
    pub fn config(&self) -> &StdoutConfig {
        &self.config
    }

    /// Shared metrics handle, valid after the sink is moved into a container
    pub fn metrics_handle(&self) -> Arc<SinkMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Render one record as a single line (no trailing newline)
    fn format_record(&self, record: &TypedRecord) -> String {
        let styles = Styles::new(self.config.color);
        let ts = format_timestamp(record.timestamp());
        let partition = format!("p:{}", self.partition_id);
        let kind = format!("{:7}", record.record_kind().as_str());
        let value_kind = format!("{:16}", record.value_kind().as_str());
        let position = format!("#{}", record.position());
        let key = format!("key:{}", record.key());

        let mut line = format!(
            "{} {} {} {} {} {} {}",
            ts.style(styles.timestamp),
            partition.style(styles.label),
            self.name.style(styles.label),
            kind.style(kind_style(record.record_kind(), self.config.color)),
            value_kind,
            position,
            key.style(styles.label),
        );

        if self.config.show_payload {
            let payload = truncate(record.value_json(), self.config.max_payload);
            line.push(' ');
            line.push_str(&payload.style(styles.payload).to_string());
        }
        line
    }
}

impl Sink for StdoutSink {
    fn configure(&mut self, context: &mut SinkContext) -> Result<(), SinkError> {
        self.config = context.parse_config()?;
        self.name = context.sink_id().to_string();
        self.partition_id = context.partition_id();
        Ok(())
    }

    fn open(&mut self, controller: Arc<dyn SinkController>) -> Result<(), SinkError> {
        tracing::info!(sink = %self.name, partition = self.partition_id, "stdout sink starting");
        self.controller = Some(controller);
        Ok(())
    }

    fn export(&mut self, record: &TypedRecord) -> Result<(), SinkError> {
        self.metrics.record_received();
        let line = self.format_record(record);

        if let Err(e) = writeln!(self.out, "{line}") {
            self.metrics.export_error();
            return Err(e.into());
        }
        self.metrics.record_exported(line.len() as u64 + 1);

        if let Some(controller) = &self.controller {
            controller.update_position(record.position());
            self.metrics.acknowledged();
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        let snapshot = self.metrics.snapshot();
        tracing::info!(
            sink = %self.name,
            records = snapshot.records_exported,
            bytes = snapshot.bytes_exported,
            "stdout sink shutting down"
        );
        self.controller = None;
        self.out.flush()?;
        Ok(())
    }
}

// =============================================================================
// Formatting helpers
// =============================================================================

/// Format timestamp as HH:MM:SS.mmm (from milliseconds)
fn format_timestamp(ts_millis: i64) -> String {
    Utc.timestamp_millis_opt(ts_millis)
        .single()
        .map(|dt| dt.format("%H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| ts_millis.to_string())
}

/// Truncate to at most `max` bytes on a char boundary (0 = no limit)
fn truncate(mut text: String, max: usize) -> String {
    if max == 0 || text.len() <= max {
        return text;
    }
    let mut cut = max.saturating_sub(3);
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str("...");
    text
}

#[cfg(test)]
#[path = "stdout_test.rs"]
mod stdout_test;
