//! Tests for the null sink

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use exporter_protocol::{
    LogEntry, Position, RecordKind, RecordMetadata, TypedRecord, ValueKind,
};
use exporter_routing::{RecordFilter, SinkId};
use parking_lot::Mutex;

use super::{NullSink, NullSinkConfig};
use crate::sink::{ScheduledTask, Sink, SinkContext, SinkController, TaskHandle};

/// Controller that records acknowledgements
#[derive(Default)]
struct RecordingController {
    positions: Mutex<Vec<Position>>,
}

impl SinkController for RecordingController {
    fn update_position(&self, position: Position) {
        self.positions.lock().push(position);
    }

    fn update_position_with_metadata(&self, position: Position, _metadata: Bytes) {
        self.positions.lock().push(position);
    }

    fn read_metadata(&self) -> Option<Bytes> {
        None
    }

    fn schedule_cancellable_task(&self, _delay: Duration, _task: ScheduledTask) -> TaskHandle {
        TaskHandle::cancelled()
    }
}

fn record(position: Position) -> TypedRecord {
    let entry = LogEntry::new(
        position,
        RecordMetadata::new(RecordKind::Event, ValueKind::Job),
        &b"{}"[..],
    );
    TypedRecord::decode(&entry).unwrap().unwrap()
}

fn context(config: &str) -> SinkContext {
    SinkContext::new(
        SinkId::new("null").unwrap(),
        1,
        config.parse().unwrap(),
        RecordFilter::accept_all(),
    )
}

#[test]
fn test_config_default() {
    assert!(NullSinkConfig::default().acknowledge);
    assert!(NullSink::new().config().acknowledge);
}

#[test]
fn test_configure_reads_options() {
    let mut sink = NullSink::new();
    sink.configure(&mut context("acknowledge = false")).unwrap();
    assert!(!sink.config().acknowledge);

    sink.configure(&mut context("")).unwrap();
    assert!(sink.config().acknowledge);
}

#[test]
fn test_export_acknowledges_each_record() {
    let controller = Arc::new(RecordingController::default());
    let mut sink = NullSink::new();
    let metrics = sink.metrics_handle();

    sink.open(controller.clone()).unwrap();
    for position in [10, 11, 12] {
        sink.export(&record(position)).unwrap();
    }
    sink.close().unwrap();

    assert_eq!(*controller.positions.lock(), vec![10, 11, 12]);
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.records_received, 3);
    assert_eq!(snapshot.acknowledgements, 3);
}

#[test]
fn test_export_without_acknowledge() {
    let controller = Arc::new(RecordingController::default());
    let mut sink = NullSink::with_config(NullSinkConfig { acknowledge: false });

    sink.open(controller.clone()).unwrap();
    sink.export(&record(1)).unwrap();

    assert!(controller.positions.lock().is_empty());
    assert_eq!(sink.metrics_handle().snapshot().records_received, 1);
}

#[test]
fn test_close_without_open() {
    let mut sink = NullSink::new();
    assert!(sink.close().is_ok());
}
