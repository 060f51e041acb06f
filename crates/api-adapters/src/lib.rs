//! # api-adapters
//!
//! Inbound side of the relay: the HTTP surface (feature `web-axum`) and the
//! Prometheus counters it feeds.

pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod http;

pub use metrics::Metrics;

#[cfg(feature = "web-axum")]
pub use http::{build_router, ApiError, AppState};
