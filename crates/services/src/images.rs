use std::sync::Arc;

use bytes::Bytes;
use domains::{CacheKey, DomainError, ImageCache, ImageProcessor, Result};

/// Serves cached thumbnails back by key.
pub struct ImageService {
    cache: Arc<dyn ImageCache>,
    processor: Arc<dyn ImageProcessor>,
}

impl ImageService {
    pub fn new(cache: Arc<dyn ImageCache>, processor: Arc<dyn ImageProcessor>) -> Self {
        Self { cache, processor }
    }

    /// Looks up `raw_key` and returns the entry re-encoded as JPEG.
    ///
    /// Malformed keys are reported as `NotFound` without touching the store.
    /// A stored entry that no longer decodes is an `Internal` error.
    pub async fn fetch_jpeg(&self, raw_key: &str) -> Result<Bytes> {
        let key = CacheKey::parse(raw_key).ok_or_else(|| DomainError::NotFound("image".into()))?;
        let stored = self
            .cache
            .get(&key)
            .await?
            .ok_or_else(|| DomainError::NotFound("image".into()))?;

        self.processor.to_jpeg(stored).await.map_err(|e| {
            tracing::error!(%key, error = %e, "cached image could not be re-encoded");
            DomainError::Internal(format!("cached image {key} is unreadable"))
        })
    }
}
