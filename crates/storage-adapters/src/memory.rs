//! In-process `ImageCache` with per-key expiry.
//!
//! Used for single-node deployments without Redis and as the store behind
//! router-level tests. Expired entries are dropped lazily on access and by
//! `purge_expired`.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use domains::{CacheKey, Clock, ImageCache, Result, SystemClock};

#[derive(Debug, Clone)]
struct Entry {
    value: Bytes,
    expires_at: DateTime<Utc>,
}

pub struct MemoryImageCache {
    entries: DashMap<CacheKey, Entry>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryImageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryImageCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn live(&self, key: &CacheKey) -> Option<Bytes> {
        let now = self.clock.now();
        // Clone out of the shard guard before touching the map again.
        let hit = self
            .entries
            .get(key)
            .map(|entry| (entry.value.clone(), entry.expires_at));

        match hit {
            Some((value, expires_at)) if expires_at > now => Some(value),
            Some(_) => {
                self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
                None
            }
            None => None,
        }
    }
}

#[async_trait]
impl ImageCache for MemoryImageCache {
    async fn exists(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.live(key).is_some())
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>> {
        Ok(self.live(key))
    }

    async fn set_with_expiry(&self, key: &CacheKey, value: Bytes, ttl_seconds: u64) -> Result<()> {
        let now = self.clock.now();
        let expires_at = i64::try_from(ttl_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        // Whole-entry replacement under the shard lock: readers see old or new, never a mix.
        self.entries.insert(key.clone(), Entry { value, expires_at });
        Ok(())
    }
}
