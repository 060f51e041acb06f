//! axum surface: routes, shared state and error mapping.

mod error;
mod handlers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use services::{ImageService, PlaybackService};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::metrics::Metrics;

pub use error::ApiError;

/// Handles shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub playback: Arc<PlaybackService>,
    pub images: Arc<ImageService>,
    pub metrics: Arc<Metrics>,
}

/// Assembles the public router.
///
/// Bodies larger than `max_upload_bytes` are refused before any handler runs.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", post(handlers::ingest))
        .route("/images/{file}", get(handlers::image))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
