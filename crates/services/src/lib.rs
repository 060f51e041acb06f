//! # services
//!
//! Application logic of the playback relay. Everything here talks to the
//! outside world through the ports defined in `domains`.

pub mod classifier;
pub mod dispatch;
pub mod images;
pub mod key;
pub mod playback;

pub use classifier::{classify, format_subtitle, format_title, location_text, ClassifiedEvent};
pub use dispatch::{DispatchWorker, NotificationDispatcher, DEFAULT_QUEUE_CAPACITY};
pub use images::ImageService;
pub use key::derive_cache_key;
pub use playback::{IngestOutcome, NotificationStatus, PlaybackService, PlaybackSettings, ThumbnailStatus};
