//! # storage-adapters
//!
//! Implementations of the `ImageCache` and `ImageProcessor` ports.
//! The in-memory cache and the normalizer are always compiled; the Redis
//! cache sits behind the `redis` feature.

pub mod memory;
pub mod normalizer;
#[cfg(feature = "redis")]
pub mod redis;

pub use memory::MemoryImageCache;
pub use normalizer::ThumbnailNormalizer;
#[cfg(feature = "redis")]
pub use self::redis::RedisImageCache;
