//! The real router wired to in-memory and recording adapters.

use std::sync::Arc;

use api_adapters::{build_router, AppState, Metrics};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use domains::{Clock, ImageProcessor, LocationLookup, Notification, SystemClock};
use serde_json::Value;
use services::{ImageService, NotificationDispatcher, PlaybackService, PlaybackSettings};
use storage_adapters::{MemoryImageCache, ThumbnailNormalizer};
use tokio::task::JoinHandle;
use tower::ServiceExt;

use crate::{multipart_body, multipart_content_type, RecordingNotifier, StaticLookup};

pub const PUBLIC_URL: &str = "http://relay.test";
pub const MAX_UPLOAD_BYTES: usize = 1024 * 1024;

pub struct TestApp {
    pub router: Router,
    pub cache: Arc<MemoryImageCache>,
    pub notifier: Arc<RecordingNotifier>,
    worker: JoinHandle<usize>,
}

/// Status and body of a finished request.
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl TestApp {
    /// Router with the system clock and a lookup that places everyone in Austin.
    pub fn spawn() -> Self {
        Self::spawn_with(Arc::new(StaticLookup::austin()), Arc::new(SystemClock))
    }

    pub fn spawn_with(lookup: Arc<dyn LocationLookup>, clock: Arc<dyn Clock>) -> Self {
        let cache = Arc::new(MemoryImageCache::with_clock(clock));
        let processor: Arc<dyn ImageProcessor> = Arc::new(ThumbnailNormalizer::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let (dispatcher, worker) = NotificationDispatcher::new(notifier.clone());
        let worker = tokio::spawn(worker.run());

        let playback = PlaybackService::new(
            cache.clone(),
            processor.clone(),
            lookup,
            Arc::new(dispatcher),
            PlaybackSettings {
                public_url: PUBLIC_URL.to_string(),
                ..PlaybackSettings::default()
            },
        );
        let state = AppState {
            playback: Arc::new(playback),
            images: Arc::new(ImageService::new(cache.clone(), processor)),
            metrics: Arc::new(Metrics::new()),
        };

        Self {
            router: build_router(state, MAX_UPLOAD_BYTES),
            cache,
            notifier,
            worker,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");
        TestResponse {
            status,
            content_type,
            body,
        }
    }

    pub async fn post_event(&self, payload: &Value, thumb: Option<&[u8]>) -> TestResponse {
        self.post_raw(multipart_body(payload, thumb)).await
    }

    pub async fn post_raw(&self, body: Vec<u8>) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, multipart_content_type())
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .expect("request");
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        self.send(request).await
    }

    /// Drops the router, waits for the queue to drain and returns everything
    /// that was delivered.
    pub async fn finish(self) -> Vec<Notification> {
        let Self {
            router,
            notifier,
            worker,
            ..
        } = self;
        drop(router);
        worker.await.expect("dispatch worker");
        notifier.sent()
    }
}
