//! Tests for record filters

use super::*;
use crate::RoutingError;

fn meta(record_kind: RecordKind, value_kind: ValueKind) -> RecordMetadata {
    RecordMetadata::new(record_kind, value_kind)
}

#[test]
fn test_accept_all() {
    let filter = RecordFilter::accept_all();
    for record_kind in RecordKind::ALL {
        for value_kind in ValueKind::ALL {
            assert!(filter.accepts(&meta(record_kind, value_kind)));
        }
    }
    assert!(!filter.is_empty());
}

#[test]
fn test_accept_none() {
    let filter = RecordFilter::accept_none();
    assert!(filter.is_empty());
    assert!(!filter.accepts(&meta(RecordKind::Event, ValueKind::Job)));
    assert_eq!(filter, RecordFilter::default());
}

#[test]
fn test_unknown_kinds_never_accepted() {
    let filter = RecordFilter::accept_all();
    assert!(!filter.accepts(&RecordMetadata::from_raw(1, 200, 0)));
    assert!(!filter.accepts(&RecordMetadata::from_raw(0, 1, 0)));
}

#[test]
fn test_cross_product() {
    let filter = RecordFilter::new(
        [RecordKind::Event],
        [ValueKind::Job, ValueKind::ProcessInstance],
    );
    assert!(filter.accepts(&meta(RecordKind::Event, ValueKind::Job)));
    assert!(filter.accepts(&meta(RecordKind::Event, ValueKind::ProcessInstance)));
    assert!(!filter.accepts(&meta(RecordKind::Command, ValueKind::Job)));
    assert!(!filter.accepts(&meta(RecordKind::Event, ValueKind::Variable)));
}

#[test]
fn test_union_is_exact() {
    let a = RecordFilter::new([RecordKind::Event], [ValueKind::Job]);
    let b = RecordFilter::new([RecordKind::Command], [ValueKind::Process]);
    let union = a.union(&b);

    assert!(union.accepts(&meta(RecordKind::Event, ValueKind::Job)));
    assert!(union.accepts(&meta(RecordKind::Command, ValueKind::Process)));
    // Neither filter accepts the crossed pairs
    assert!(!union.accepts(&meta(RecordKind::Event, ValueKind::Process)));
    assert!(!union.accepts(&meta(RecordKind::Command, ValueKind::Job)));
}

#[test]
fn test_union_all() {
    let filters = [
        RecordFilter::accept_none(),
        RecordFilter::new([RecordKind::Event], [ValueKind::Timer]),
    ];
    let union = RecordFilter::union_all(&filters);
    assert!(union.accepts(&meta(RecordKind::Event, ValueKind::Timer)));
    assert!(RecordFilter::union_all(std::iter::empty()).is_empty());
}

#[test]
fn test_from_names() {
    let filter = RecordFilter::from_names(&["event"], &["job", "incident"]).unwrap();
    assert!(filter.accepts(&meta(RecordKind::Event, ValueKind::Incident)));
    assert!(!filter.accepts(&meta(RecordKind::Command, ValueKind::Job)));
}

#[test]
fn test_from_names_empty_means_all() {
    let empty: [&str; 0] = [];
    let filter = RecordFilter::from_names(&empty, &empty).unwrap();
    assert_eq!(filter, RecordFilter::accept_all());

    let events = RecordFilter::from_names(&["event"], &empty).unwrap();
    assert!(events.accepts(&meta(RecordKind::Event, ValueKind::Signal)));
    assert!(!events.accepts(&meta(RecordKind::Command, ValueKind::Signal)));
}

#[test]
fn test_from_names_rejects_unknown() {
    let err = RecordFilter::from_names(&["event"], &["jobs"]).unwrap_err();
    assert!(matches!(err, RoutingError::UnknownKind(_)));
    assert!(err.to_string().contains("jobs"));
}
