//! Behaviour every adapter of a port must share, checked against the
//! in-process implementations.

use std::sync::Arc;

use bytes::Bytes;
use chrono::TimeDelta;
use domains::{
    CacheKey, Colour, DomainError, ImageCache, ImageProcessor, MockNotifier, Notification,
    NotificationQueue, THUMBNAIL_EDGE,
};
use image::GenericImageView;
use integration_tests::{png, ManualClock};
use services::{derive_cache_key, NotificationDispatcher};
use storage_adapters::{MemoryImageCache, ThumbnailNormalizer};
use tokio_test::{assert_err, assert_ok};

fn notification(text: &str) -> Notification {
    Notification {
        username: "Plex".into(),
        text: text.into(),
        colour: Colour::Good,
        title: "Arrival (2016)".into(),
        subtitle: String::new(),
        thumb_url: None,
        footer: None,
        location: None,
    }
}

#[tokio::test]
async fn cache_set_replaces_value_and_expiry_together() {
    let clock = Arc::new(ManualClock::default());
    let cache = MemoryImageCache::with_clock(clock.clone());
    let key = derive_cache_key("srv-1", "2001");

    assert_ok!(cache.set_with_expiry(&key, Bytes::from_static(b"old"), 10).await);
    clock.advance(TimeDelta::seconds(5));
    assert_ok!(cache.set_with_expiry(&key, Bytes::from_static(b"new"), 10).await);

    clock.advance(TimeDelta::seconds(9));
    assert_eq!(cache.get(&key).await.unwrap(), Some(Bytes::from_static(b"new")));

    clock.advance(TimeDelta::seconds(1));
    assert!(!cache.exists(&key).await.unwrap());
    assert_eq!(cache.get(&key).await.unwrap(), None);
}

#[tokio::test]
async fn cache_keys_are_independent() {
    let cache = MemoryImageCache::new();
    let a = derive_cache_key("srv-1", "1");
    let b = derive_cache_key("srv-1", "2");
    assert_ok!(cache.set_with_expiry(&a, Bytes::from_static(b"a"), 60).await);

    assert!(cache.exists(&a).await.unwrap());
    assert!(!cache.exists(&b).await.unwrap());
    assert_eq!(cache.len(), 1);
}

#[test]
fn derived_keys_are_valid_cache_keys() {
    let key = derive_cache_key("srv-1", "2001");
    assert_eq!(key.as_str().len(), CacheKey::LEN);
    assert_eq!(CacheKey::parse(key.as_str()), Some(key.clone()));
    assert_ne!(key, derive_cache_key("srv-2", "2001"));
}

#[tokio::test]
async fn normalized_output_round_trips_through_the_cache() {
    let normalizer = ThumbnailNormalizer::default();
    let cache = MemoryImageCache::new();
    let key = derive_cache_key("srv-1", "2001");

    let thumb = normalizer
        .normalize(Bytes::from(png(640, 360, [120, 10, 10])))
        .await
        .unwrap();
    assert_ok!(cache.set_with_expiry(&key, thumb, 60).await);

    let served = normalizer
        .to_jpeg(cache.get(&key).await.unwrap().unwrap())
        .await
        .unwrap();
    let decoded = image::load_from_memory(&served).unwrap();
    assert_eq!(decoded.dimensions(), (THUMBNAIL_EDGE, THUMBNAIL_EDGE));
}

#[tokio::test]
async fn dispatch_keeps_going_after_a_failed_delivery() {
    let mut notifier = MockNotifier::new();
    notifier
        .expect_send()
        .withf(|n| n.text == "first")
        .times(1)
        .returning(|_| Err(DomainError::Delivery("webhook returned 500".into())));
    notifier
        .expect_send()
        .withf(|n| n.text == "second")
        .times(1)
        .returning(|_| Ok(()));

    let (dispatcher, worker) = NotificationDispatcher::new(Arc::new(notifier));
    assert_ok!(dispatcher.enqueue(notification("first")));
    assert_ok!(dispatcher.enqueue(notification("second")));
    drop(dispatcher);

    assert_eq!(worker.run().await, 1);
}

#[tokio::test]
async fn enqueue_fails_once_the_worker_is_gone() {
    let (dispatcher, worker) = NotificationDispatcher::new(Arc::new(MockNotifier::new()));
    drop(worker);
    assert_err!(dispatcher.enqueue(notification("late")));
}
