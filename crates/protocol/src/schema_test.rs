//! Tests for record and value kinds

use crate::schema::{RecordKind, ValueKind};

// =============================================================================
// RecordKind
// =============================================================================

#[test]
fn test_record_kind_from_u8() {
    assert_eq!(RecordKind::from_u8(1), RecordKind::Event);
    assert_eq!(RecordKind::from_u8(2), RecordKind::Command);
    assert_eq!(RecordKind::from_u8(3), RecordKind::CommandRejection);
}

#[test]
fn test_record_kind_invalid_returns_unknown() {
    assert_eq!(RecordKind::from_u8(0), RecordKind::Unknown);
    assert_eq!(RecordKind::from_u8(4), RecordKind::Unknown);
    assert_eq!(RecordKind::from_u8(255), RecordKind::Unknown);
}

#[test]
fn test_record_kind_parse_names() {
    for kind in RecordKind::ALL {
        assert_eq!(kind.as_str().parse::<RecordKind>().unwrap(), kind);
    }
    assert!("unknown".parse::<RecordKind>().is_err());
    assert!("Event".parse::<RecordKind>().is_err());
}

// =============================================================================
// ValueKind
// =============================================================================

#[test]
fn test_value_kind_wire_values_are_stable() {
    assert_eq!(ValueKind::Job.as_u8(), 1);
    assert_eq!(ValueKind::ProcessInstance.as_u8(), 4);
    assert_eq!(ValueKind::Signal.as_u8(), 12);
}

#[test]
fn test_value_kind_all_roundtrip_through_u8() {
    for kind in ValueKind::ALL {
        assert_eq!(ValueKind::from_u8(kind.as_u8()), kind);
        assert!(kind.is_known());
    }
}

#[test]
fn test_value_kind_unknown_is_not_known() {
    assert_eq!(ValueKind::from_u8(200), ValueKind::Unknown);
    assert!(!ValueKind::Unknown.is_known());
}

#[test]
fn test_value_kind_display() {
    assert_eq!(ValueKind::MessageSubscription.to_string(), "message_subscription");
    assert_eq!(
        "user_task".parse::<ValueKind>().unwrap(),
        ValueKind::UserTask
    );
}
