//! # Ports
//!
//! Every adapter the binary wires in implements one of these traits. The
//! services crate only ever sees `Arc<dyn Port>`, which keeps the pipeline
//! testable with the `mockall` doubles behind the `testing` feature.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::models::{CacheKey, Location, Notification};

/// Key-to-binary store with per-key expiry.
///
/// `set_with_expiry` must replace the value in one atomic step: a concurrent
/// reader sees either the previous value or the new one, never a mix.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ImageCache: Send + Sync {
    /// True iff a live (non-expired) entry exists.
    async fn exists(&self, key: &CacheKey) -> Result<bool>;
    /// Raw stored bytes, or `None` if nothing live is stored.
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>>;
    async fn set_with_expiry(&self, key: &CacheKey, value: Bytes, ttl_seconds: u64) -> Result<()>;
}

/// Image transformations. Implementations are CPU-bound and are expected to
/// move the work off the async executor.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ImageProcessor: Send + Sync {
    /// Decodes an upload and produces the canonical square thumbnail.
    async fn normalize(&self, raw: Bytes) -> Result<Bytes>;
    /// Re-encodes a stored thumbnail to the served content type.
    async fn to_jpeg(&self, stored: Bytes) -> Result<Bytes>;
}

/// Resolves an IP address to a rough location.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LocationLookup: Send + Sync {
    async fn locate(&self, ip: &str) -> Result<Location>;
}

/// Delivers a finished message to the chat channel.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// Accepts a message for delivery without waiting on it.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait NotificationQueue: Send + Sync {
    fn enqueue(&self, notification: Notification) -> Result<()>;
}

/// Source of the current time, injectable so expiry can be tested.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
