//! Tests for the in-memory log

use super::*;
use crate::entry::RecordMetadata;
use crate::schema::{RecordKind, ValueKind};

fn entry(position: Position) -> LogEntry {
    LogEntry::new(
        position,
        RecordMetadata::new(RecordKind::Event, ValueKind::Job),
        &b"{}"[..],
    )
}

fn log_with(positions: &[Position]) -> MemoryLog {
    let log = MemoryLog::new();
    log.append_all(positions.iter().copied().map(entry)).unwrap();
    log
}

// ============================================================================
// Appending
// ============================================================================

#[test]
fn test_new_log_is_empty() {
    let log = MemoryLog::new();
    assert!(log.is_empty());
    assert_eq!(log.last_position(), NO_POSITION);
}

#[test]
fn test_append_requires_increasing_positions() {
    let log = log_with(&[10, 11]);
    assert_eq!(log.len(), 2);
    assert_eq!(log.last_position(), 11);

    let err = log.append(entry(11)).unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::PositionNotIncreasing {
            position: 11,
            last: 11
        }
    ));
    assert_eq!(log.len(), 2);
}

#[test]
fn test_clones_share_entries() {
    let log = MemoryLog::new();
    let writer = log.clone();
    writer.append(entry(1)).unwrap();
    assert_eq!(log.len(), 1);
}

// ============================================================================
// Reading
// ============================================================================

#[test]
fn test_reader_reads_in_order() {
    let log = log_with(&[10, 11, 12]);
    let mut reader = log.new_reader();

    let mut seen = Vec::new();
    while reader.has_next() {
        seen.push(reader.next_entry().unwrap().position());
    }
    assert_eq!(seen, vec![10, 11, 12]);
    assert!(reader.next_entry().is_none());
}

#[test]
fn test_reader_sees_entries_appended_later() {
    let log = log_with(&[1]);
    let mut reader = log.new_reader();
    assert_eq!(reader.next_entry().unwrap().position(), 1);
    assert!(!reader.has_next());

    log.append(entry(2)).unwrap();
    assert!(reader.has_next());
    assert_eq!(reader.next_entry().unwrap().position(), 2);
}

#[test]
fn test_seek_to_existing_and_gap_positions() {
    let log = log_with(&[10, 20, 30]);
    let mut reader = log.new_reader();

    assert!(reader.seek_to(20));
    assert_eq!(reader.next_entry().unwrap().position(), 20);

    // Positions are not dense - seeking into a gap lands on the next entry
    assert!(reader.seek_to(21));
    assert_eq!(reader.next_entry().unwrap().position(), 30);

    assert!(!reader.seek_to(31));
    assert!(!reader.has_next());
}

#[test]
fn test_seek_before_start() {
    let log = log_with(&[10, 11]);
    let mut reader = log.new_reader();
    assert!(reader.seek_to(0));
    assert_eq!(reader.next_entry().unwrap().position(), 10);
}

// ============================================================================
// Commit notifications
// ============================================================================

#[tokio::test]
async fn test_subscribe_observes_commits() {
    let log = MemoryLog::new();
    let mut rx = log.subscribe();
    assert_eq!(*rx.borrow(), NO_POSITION);

    log.append(entry(5)).unwrap();
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), 5);
}
