//! Tests for subscriber management

use super::*;

fn frame(tag: u8) -> Bytes {
    Bytes::from(vec![tag])
}

#[tokio::test]
async fn test_subscribe_unique_ids() {
    let manager = SubscriberManager::new();

    let (id1, _rx1) = manager.subscribe().unwrap();
    let (id2, _rx2) = manager.subscribe().unwrap();

    assert!(id1 > 0);
    assert_ne!(id1, id2);
    assert_eq!(manager.count(), 2);
}

#[tokio::test]
async fn test_unsubscribe() {
    let manager = SubscriberManager::new();
    let (id, _rx) = manager.subscribe().unwrap();

    manager.unsubscribe(id).unwrap();
    assert_eq!(manager.count(), 0);
    assert!(!manager.has_subscribers());

    assert!(matches!(
        manager.unsubscribe(id),
        Err(DistributionError::SubscriberNotFound { .. })
    ));
}

#[tokio::test]
async fn test_max_subscribers() {
    let manager = SubscriberManager::new();
    let mut receivers = Vec::new();
    for _ in 0..MAX_SUBSCRIBERS {
        receivers.push(manager.subscribe().unwrap());
    }
    assert!(matches!(
        manager.subscribe(),
        Err(DistributionError::MaxSubscribers { .. })
    ));
}

#[tokio::test]
async fn test_broadcast_reaches_all() {
    let manager = SubscriberManager::new();
    let (_, mut rx1) = manager.subscribe().unwrap();
    let (_, mut rx2) = manager.subscribe().unwrap();

    assert_eq!(manager.broadcast(&frame(1)), 2);
    assert_eq!(rx1.recv().await.unwrap(), frame(1));
    assert_eq!(rx2.recv().await.unwrap(), frame(1));
}

#[tokio::test]
async fn test_broadcast_drops_when_queue_full() {
    let manager = SubscriberManager::new();
    let (_, mut rx) = manager.subscribe().unwrap();

    for i in 0..CHANNEL_BUFFER_SIZE {
        assert_eq!(manager.broadcast(&frame(i as u8)), 1);
    }
    // Queue is full: dropped, not blocked
    assert_eq!(manager.broadcast(&frame(255)), 0);

    assert_eq!(rx.recv().await.unwrap(), frame(0));
}

#[tokio::test]
async fn test_cleanup_disconnected() {
    let manager = SubscriberManager::new();
    let (_, rx1) = manager.subscribe().unwrap();
    let (_, _rx2) = manager.subscribe().unwrap();

    drop(rx1);
    assert_eq!(manager.cleanup_disconnected(), 1);
    assert_eq!(manager.count(), 1);
}

#[tokio::test]
async fn test_clear_ends_streams() {
    let manager = SubscriberManager::new();
    let (_, mut rx) = manager.subscribe().unwrap();

    assert_eq!(manager.clear(), 1);
    assert!(rx.recv().await.is_none());
}
