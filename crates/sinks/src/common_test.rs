//! Tests for common sink types and utilities

use crate::{SinkError, SinkMetrics};

#[test]
fn test_metrics_new() {
    let metrics = SinkMetrics::new();
    let snapshot = metrics.snapshot();

    assert_eq!(snapshot.records_received, 0);
    assert_eq!(snapshot.records_exported, 0);
    assert_eq!(snapshot.bytes_exported, 0);
    assert_eq!(snapshot.export_errors, 0);
    assert_eq!(snapshot.acknowledgements, 0);
}

#[test]
fn test_metrics_tracking() {
    let metrics = SinkMetrics::new();

    metrics.record_received();
    metrics.record_received();
    metrics.record_exported(120);
    metrics.export_error();
    metrics.record_exported(80);
    metrics.acknowledged();

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.records_received, 2);
    assert_eq!(snapshot.records_exported, 2);
    assert_eq!(snapshot.bytes_exported, 200);
    assert_eq!(snapshot.export_errors, 1);
    assert_eq!(snapshot.acknowledgements, 1);
}

#[test]
fn test_metrics_reset() {
    let metrics = SinkMetrics::new();
    metrics.record_received();
    metrics.record_exported(10);
    metrics.reset();

    assert_eq!(metrics.snapshot(), Default::default());
}

#[test]
fn test_error_display() {
    assert!(SinkError::init("no socket").to_string().contains("initialize"));
    assert!(SinkError::write("disk full").to_string().contains("disk full"));
    assert!(SinkError::config("missing url").to_string().contains("configuration"));
    assert!(
        SinkError::UnknownType("kafka".into())
            .to_string()
            .contains("kafka")
    );
}

#[test]
fn test_only_unrecoverable_is_not_retryable() {
    assert!(SinkError::write("timeout").is_retryable());
    assert!(SinkError::Connection("refused".into()).is_retryable());
    assert!(SinkError::config("bad").is_retryable());
    assert!(SinkError::from(std::io::Error::other("eio")).is_retryable());
    assert!(!SinkError::unrecoverable("schema mismatch").is_retryable());
}
