//! Webhook ingestion through the full router.

use std::sync::Arc;

use axum::http::StatusCode;
use domains::{Colour, ImageCache, SystemClock, THUMBNAIL_EDGE};
use image::GenericImageView;
use integration_tests::app::{TestApp, PUBLIC_URL};
use integration_tests::{
    movie_event, multipart_raw, png, track_event, FailingLookup, RATING_KEY, SERVER_UUID,
};
use serde_json::json;
use services::derive_cache_key;

#[tokio::test]
async fn movie_play_caches_thumbnail_and_announces_it() {
    let app = TestApp::spawn();
    let res = app
        .post_event(&movie_event("media.play"), Some(&png(300, 450, [10, 20, 200])))
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let key = derive_cache_key(SERVER_UUID, RATING_KEY);
    assert!(app.cache.exists(&key).await.unwrap());
    assert_eq!(app.cache.len(), 1);

    let sent = app.finish().await;
    assert_eq!(sent.len(), 1);
    let n = &sent[0];
    assert_eq!(n.username, "Plex");
    assert_eq!(
        n.text,
        "alice started watching Arrival (2016) on Den near Austin, Texas"
    );
    assert_eq!(n.colour, Colour::Good);
    assert_eq!(n.title, "Arrival (2016)");
    assert_eq!(n.subtitle, "Why are they here?");
    assert_eq!(
        n.thumb_url.as_deref(),
        Some(format!("{PUBLIC_URL}/images/{key}.jpg").as_str())
    );
    assert_eq!(n.footer.as_deref(), Some("A linguist works with the military."));
}

#[tokio::test]
async fn pause_is_announced_in_amber() {
    let app = TestApp::spawn();
    let res = app.post_event(&movie_event("media.pause"), None).await;
    assert_eq!(res.status, StatusCode::OK);

    let sent = app.finish().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.starts_with("alice paused playback of Arrival (2016)"));
    assert_eq!(sent[0].colour.as_str(), "#a67a2d");
    assert_eq!(sent[0].thumb_url, None);
}

#[tokio::test]
async fn stop_and_resume_use_their_own_wording() {
    let app = TestApp::spawn();
    assert_eq!(app.post_event(&movie_event("media.stop"), None).await.status, StatusCode::OK);
    assert_eq!(app.post_event(&movie_event("media.resume"), None).await.status, StatusCode::OK);

    let sent = app.finish().await;
    assert_eq!(sent.len(), 2);
    assert!(sent[0].text.contains("stopped watching"));
    assert_eq!(sent[0].colour.as_str(), "danger");
    assert!(sent[1].text.contains("resumed playback of"));
    assert_eq!(sent[1].colour.as_str(), "#36a64f");
}

#[tokio::test]
async fn audio_play_caches_but_stays_quiet() {
    let app = TestApp::spawn();
    let res = app
        .post_event(&track_event("media.play"), Some(&png(64, 64, [0, 200, 0])))
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let key = derive_cache_key(SERVER_UUID, "77");
    assert!(app.cache.exists(&key).await.unwrap());
    assert!(app.finish().await.is_empty());
}

#[tokio::test]
async fn location_outage_still_delivers() {
    let app = TestApp::spawn_with(Arc::new(FailingLookup), Arc::new(SystemClock));
    let res = app.post_event(&movie_event("media.play"), None).await;
    assert_eq!(res.status, StatusCode::OK);

    let sent = app.finish().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text, "alice started watching Arrival (2016) on Den");
    assert_eq!(sent[0].location, None);
}

#[tokio::test]
async fn existing_thumbnail_is_reused_not_replaced() {
    let app = TestApp::spawn();
    let key = derive_cache_key(SERVER_UUID, RATING_KEY);

    app.post_event(&movie_event("media.play"), Some(&png(100, 100, [200, 0, 0])))
        .await;
    let first = app.cache.get(&key).await.unwrap().unwrap();

    app.post_event(&movie_event("media.play"), None).await;
    app.post_event(&movie_event("media.resume"), Some(&png(100, 100, [0, 0, 200])))
        .await;
    assert_eq!(app.cache.get(&key).await.unwrap().unwrap(), first);
    assert_eq!(app.cache.len(), 1);

    let sent = app.finish().await;
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().all(|n| n.thumb_url.is_some()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_plays_leave_one_whole_thumbnail() {
    let app = TestApp::spawn();
    let red = png(300, 200, [200, 0, 0]);
    let blue = png(200, 300, [0, 0, 200]);
    let payload = movie_event("media.play");

    let (a, b) = tokio::join!(
        app.post_event(&payload, Some(&red)),
        app.post_event(&payload, Some(&blue)),
    );
    assert_eq!(a.status, StatusCode::OK);
    assert_eq!(b.status, StatusCode::OK);
    assert_eq!(app.cache.len(), 1);

    let key = derive_cache_key(SERVER_UUID, RATING_KEY);
    let stored = app.cache.get(&key).await.unwrap().unwrap();
    let thumb = image::load_from_memory(&stored).unwrap();
    assert_eq!(thumb.dimensions(), (THUMBNAIL_EDGE, THUMBNAIL_EDGE));

    let res = app.get(&format!("/images/{key}.jpg")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(app.finish().await.len(), 2);
}

#[tokio::test]
async fn undecodable_upload_is_announced_without_image() {
    let app = TestApp::spawn();
    let res = app
        .post_event(&movie_event("media.play"), Some(b"not an image"))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(app.cache.is_empty());

    let sent = app.finish().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].thumb_url, None);
}

#[tokio::test]
async fn unknown_phase_is_acknowledged_and_ignored() {
    let app = TestApp::spawn();
    let res = app
        .post_event(&movie_event("media.scrobble"), Some(&png(10, 10, [1, 2, 3])))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(app.cache.is_empty());
    assert!(app.finish().await.is_empty());
}

#[tokio::test]
async fn payload_without_metadata_is_rejected() {
    let app = TestApp::spawn();
    let mut payload = movie_event("media.play");
    payload.as_object_mut().unwrap().remove("Metadata");

    let res = app.post_event(&payload, Some(&png(10, 10, [1, 2, 3]))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(app.cache.is_empty());
    assert!(app.finish().await.is_empty());
}

#[tokio::test]
async fn payload_without_user_is_rejected() {
    let app = TestApp::spawn();
    let mut payload = movie_event("media.play");
    payload["user"] = json!(false);

    let res = app.post_event(&payload, None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(app.finish().await.is_empty());
}

#[tokio::test]
async fn unsupported_library_is_rejected() {
    let app = TestApp::spawn();
    let mut payload = movie_event("media.play");
    payload["Metadata"]["librarySectionType"] = json!("photo");

    let res = app.post_event(&payload, None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(app.finish().await.is_empty());
}

#[tokio::test]
async fn missing_or_broken_payload_field_is_rejected() {
    let app = TestApp::spawn();

    let res = app.post_raw(multipart_raw(None, Some(b"thumb"))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.post_raw(multipart_raw(Some("{not json"), None)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.text().contains("payload"));
}

#[tokio::test]
async fn oversized_upload_is_refused() {
    let app = TestApp::spawn();
    let huge = vec![0u8; integration_tests::app::MAX_UPLOAD_BYTES + 1];
    let res = app.post_event(&movie_event("media.play"), Some(&huge)).await;
    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(app.cache.is_empty());
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = TestApp::spawn();
    let res = app.get("/nope").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.text(), "Not Found");
}

#[tokio::test]
async fn health_and_metrics_are_served() {
    let app = TestApp::spawn();
    let res = app.get("/health").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.text(), "ok");

    app.post_event(&movie_event("media.play"), Some(&png(20, 20, [9, 9, 9])))
        .await;
    let res = app.get("/metrics").await;
    assert_eq!(res.status, StatusCode::OK);
    let text = res.text();
    assert!(text.contains(r#"playback_relay_events_total{phase="play"} 1"#), "{text}");
    assert!(text.contains("playback_relay_thumbnails_stored_total 1"), "{text}");
    assert!(text.contains("playback_relay_notifications_queued_total 1"), "{text}");
}
