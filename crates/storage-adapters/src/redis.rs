//! Redis-backed `ImageCache`.
//!
//! Entries are stored under the bare cache key so thumbnails written by
//! earlier deployments stay readable. `SET key value EX ttl` is a single
//! command, which gives the atomic replace-with-expiry the port requires.

use async_trait::async_trait;
use bytes::Bytes;
use deadpool_redis::redis::{self, AsyncCommands};
use deadpool_redis::{Config, Connection, Pool, Runtime};
use domains::{CacheKey, DomainError, ImageCache, Result};

#[derive(Clone)]
pub struct RedisImageCache {
    pool: Pool,
}

impl RedisImageCache {
    /// Builds the pool; no connection is opened until first use.
    pub fn from_url(url: &str) -> Result<Self> {
        let pool = Config::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| DomainError::infrastructure(format!("failed to build redis pool: {e}")))?;
        Ok(Self { pool })
    }

    /// Round-trips a `PING`, used at startup to surface a bad URL early.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(command_error)?;
        Ok(())
    }

    async fn conn(&self) -> Result<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| DomainError::infrastructure(format!("redis pool unavailable: {e}")))
    }
}

fn command_error(e: redis::RedisError) -> DomainError {
    DomainError::infrastructure(format!("redis command failed: {e}"))
}

#[async_trait]
impl ImageCache for RedisImageCache {
    async fn exists(&self, key: &CacheKey) -> Result<bool> {
        let mut conn = self.conn().await?;
        conn.exists(key.as_str()).await.map_err(command_error)
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>> {
        let mut conn = self.conn().await?;
        let value: Option<Vec<u8>> = conn.get(key.as_str()).await.map_err(command_error)?;
        Ok(value.map(Bytes::from))
    }

    async fn set_with_expiry(&self, key: &CacheKey, value: Bytes, ttl_seconds: u64) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: () = conn
            .set_ex(key.as_str(), &value[..], ttl_seconds)
            .await
            .map_err(command_error)?;
        Ok(())
    }
}
