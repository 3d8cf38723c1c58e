//! Stdout sink tests

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use exporter_protocol::{
    LogEntry, Position, RecordKind, RecordMetadata, TypedRecord, ValueKind,
};
use exporter_routing::{RecordFilter, SinkId};
use parking_lot::Mutex;

use super::{StdoutConfig, StdoutSink, format_timestamp, truncate};
use crate::sink::{ScheduledTask, Sink, SinkContext, SinkController, TaskHandle};

/// Writer appending into a shared buffer
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writer that always fails
struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct AckController {
    acked: Mutex<Vec<Position>>,
}

impl SinkController for AckController {
    fn update_position(&self, position: Position) {
        self.acked.lock().push(position);
    }

    fn update_position_with_metadata(&self, position: Position, _metadata: Bytes) {
        self.acked.lock().push(position);
    }

    fn read_metadata(&self) -> Option<Bytes> {
        None
    }

    fn schedule_cancellable_task(&self, _delay: Duration, _task: ScheduledTask) -> TaskHandle {
        TaskHandle::cancelled()
    }
}

fn record(position: Position, kind: RecordKind, payload: &'static [u8]) -> TypedRecord {
    let entry = LogEntry::new(position, RecordMetadata::new(kind, ValueKind::Job), payload)
        .with_key(7)
        .with_timestamp(0);
    TypedRecord::decode(&entry).unwrap().unwrap()
}

fn configured(buffer: &SharedBuffer, config: &str) -> StdoutSink {
    let mut sink = StdoutSink::with_writer(Box::new(buffer.clone()));
    let mut context = SinkContext::new(
        SinkId::new("debug").unwrap(),
        2,
        config.parse().unwrap(),
        RecordFilter::accept_all(),
    );
    sink.configure(&mut context).unwrap();
    sink
}

// ============================================================================
// StdoutConfig Tests
// ============================================================================

#[test]
fn test_config_default() {
    let config = StdoutConfig::default();
    assert!(config.color);
    assert!(config.show_payload);
    assert_eq!(config.max_payload, 120);
}

#[test]
fn test_config_no_color() {
    let config = StdoutConfig::no_color();
    assert!(!config.color);
    assert!(config.show_payload);
}

#[test]
fn test_configure_parses_table() {
    let buffer = SharedBuffer::default();
    let sink = configured(&buffer, "color = false\nmax_payload = 10");
    assert!(!sink.config().color);
    assert_eq!(sink.config().max_payload, 10);
}

// ============================================================================
// Export Tests
// ============================================================================

#[test]
fn test_export_prints_and_acknowledges() {
    let buffer = SharedBuffer::default();
    let controller = Arc::new(AckController::default());
    let mut sink = configured(&buffer, "color = false");
    let metrics = sink.metrics_handle();

    sink.open(controller.clone()).unwrap();
    sink.export(&record(10, RecordKind::Event, br#"{"type":"email"}"#))
        .unwrap();
    sink.export(&record(11, RecordKind::Command, b"")).unwrap();
    sink.close().unwrap();

    let lines = buffer.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("00:00:00.000 p:2 debug event"));
    assert!(lines[0].contains("#10"));
    assert!(lines[0].contains("key:7"));
    assert!(lines[0].ends_with(r#"{"type":"email"}"#));
    assert!(lines[1].contains("command"));
    assert!(lines[1].ends_with("{}"));

    assert_eq!(*controller.acked.lock(), vec![10, 11]);
    assert_eq!(metrics.snapshot().records_exported, 2);
}

#[test]
fn test_export_without_payload() {
    let buffer = SharedBuffer::default();
    let mut sink = configured(&buffer, "color = false\nshow_payload = false");
    sink.export(&record(1, RecordKind::Event, br#"{"a":1}"#))
        .unwrap();
    assert!(buffer.lines()[0].ends_with("key:7"));
}

#[test]
fn test_write_failure_is_retryable() {
    let mut sink = StdoutSink::with_writer(Box::new(BrokenPipe));
    let err = sink
        .export(&record(1, RecordKind::Event, b"{}"))
        .unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(sink.metrics_handle().snapshot().export_errors, 1);
}

// ============================================================================
// Formatting helpers
// ============================================================================

#[test]
fn test_format_timestamp() {
    assert_eq!(format_timestamp(0), "00:00:00.000");
    assert_eq!(format_timestamp(3_723_004), "01:02:03.004");
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short".into(), 10), "short");
    assert_eq!(truncate("0123456789abc".into(), 10), "0123456...");
    assert_eq!(truncate("unlimited".into(), 0), "unlimited");
    // Never splits a multi-byte character
    let truncated = truncate("ééééé".into(), 6);
    assert!(truncated.ends_with("..."));
    assert!(truncated.len() <= 6);
}
