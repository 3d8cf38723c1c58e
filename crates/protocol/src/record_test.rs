//! Tests for record decoding

use crate::entry::{LogEntry, RecordMetadata};
use crate::record::TypedRecord;
use crate::schema::{RecordKind, ValueKind};

fn job_entry(position: i64, payload: &'static [u8]) -> LogEntry {
    LogEntry::new(
        position,
        RecordMetadata::new(RecordKind::Event, ValueKind::Job),
        payload,
    )
}

#[test]
fn test_decode_object_payload() {
    let entry = job_entry(10, br#"{"type":"email","retries":3}"#)
        .with_key(2251799813685249)
        .with_timestamp(1_700_000_000_000);

    let record = TypedRecord::decode(&entry).unwrap().unwrap();
    assert_eq!(record.position(), 10);
    assert_eq!(record.key(), 2251799813685249);
    assert_eq!(record.timestamp(), 1_700_000_000_000);
    assert_eq!(record.record_kind(), RecordKind::Event);
    assert_eq!(record.value_kind(), ValueKind::Job);
    assert_eq!(record.field("type").and_then(|v| v.as_str()), Some("email"));
    assert_eq!(record.field("retries").and_then(|v| v.as_i64()), Some(3));
}

#[test]
fn test_decode_empty_payload_is_empty_value() {
    let record = TypedRecord::decode(&job_entry(1, b"")).unwrap().unwrap();
    assert!(record.value().is_empty());
    assert_eq!(record.value_json(), "{}");
}

#[test]
fn test_decode_unknown_value_kind_is_not_exportable() {
    let entry = LogEntry::new(5, RecordMetadata::from_raw(1, 250, 0), &b"{}"[..]);
    assert!(TypedRecord::decode(&entry).unwrap().is_none());
}

#[test]
fn test_decode_malformed_payload_fails() {
    let err = TypedRecord::decode(&job_entry(3, b"{\"type\":")).unwrap_err();
    assert!(err.is_decode_error());
}

#[test]
fn test_decode_non_object_payload_fails() {
    let err = TypedRecord::decode(&job_entry(4, b"[1,2,3]")).unwrap_err();
    assert!(err.is_decode_error());
    assert!(err.to_string().contains("not an object"));
}

#[test]
fn test_metadata_keeps_raw_value_kind() {
    let metadata = RecordMetadata::from_raw(2, 99, 7);
    assert_eq!(metadata.record_kind(), RecordKind::Command);
    assert_eq!(metadata.value_kind(), ValueKind::Unknown);
    assert_eq!(metadata.raw_value_kind(), 99);
    assert_eq!(metadata.intent(), 7);
}
