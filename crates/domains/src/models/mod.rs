//! # Domain Models
//!
//! These types represent the core entities of the playback relay: the webhook
//! payload as the media server sends it, the cache key derived from it, the
//! closed classifications the pipeline branches on, and the outbound message.

mod classification;
mod event;
mod key;
mod notification;

pub use classification::{Colour, LifecyclePhase, MediaClass, PlaybackAction};
pub use event::{Account, EventPayload, Metadata, Player, ServerInfo};
pub use key::CacheKey;
pub use notification::{Location, Notification};

/// Cached thumbnails live for seven days from the moment they are written.
pub const THUMBNAIL_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Edge length, in pixels, of the canonical square thumbnail.
pub const THUMBNAIL_EDGE: u32 = 75;
