//! # Playback Pipeline
//!
//! Orchestrates one webhook: gate the payload, make sure the item's thumbnail
//! is cached, and queue a chat notification for video playback.
//!
//! Only the gate can fail the request. Cache, image and location problems
//! degrade the result (no thumbnail, no location text) and are logged.

use std::sync::Arc;

use bytes::Bytes;
use domains::{
    CacheKey, EventPayload, ImageCache, ImageProcessor, LifecyclePhase, LocationLookup,
    MediaClass, Notification, NotificationQueue, PlaybackAction, Result, THUMBNAIL_TTL_SECONDS,
};
use tracing::{debug, info, warn};

use crate::classifier::{classify, format_subtitle, format_title, location_text};

/// Deployment values the pipeline needs.
#[derive(Debug, Clone)]
pub struct PlaybackSettings {
    /// Externally reachable base URL; thumbnail links are built from it
    pub public_url: String,
    /// Name notifications are posted under
    pub username: String,
    pub thumbnail_ttl_seconds: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            public_url: "http://localhost:11000".into(),
            username: "Plex".into(),
            thumbnail_ttl_seconds: THUMBNAIL_TTL_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailStatus {
    /// Phase does not touch the cache
    Skipped,
    /// An entry already existed; nothing written
    Reused,
    /// A new upload was normalized and written
    Stored,
    /// No entry and nothing uploaded
    Missing,
    /// Upload was undecodable or the write failed
    Failed,
}

impl ThumbnailStatus {
    pub fn is_available(self) -> bool {
        matches!(self, Self::Reused | Self::Stored)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationStatus {
    /// Audio items are never announced
    NotEligible,
    /// Video item, but the phase has no action
    NotNotifiable,
    Queued,
    /// The dispatch queue refused the message
    Failed,
}

/// What happened to one ingested event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub key: CacheKey,
    pub media: MediaClass,
    pub phase: LifecyclePhase,
    pub thumbnail: ThumbnailStatus,
    pub notification: NotificationStatus,
}

/// State shared across all request handlers.
pub struct PlaybackService {
    cache: Arc<dyn ImageCache>,
    processor: Arc<dyn ImageProcessor>,
    locator: Arc<dyn LocationLookup>,
    queue: Arc<dyn NotificationQueue>,
    settings: PlaybackSettings,
}

impl PlaybackService {
    pub fn new(
        cache: Arc<dyn ImageCache>,
        processor: Arc<dyn ImageProcessor>,
        locator: Arc<dyn LocationLookup>,
        queue: Arc<dyn NotificationQueue>,
        settings: PlaybackSettings,
    ) -> Self {
        Self {
            cache,
            processor,
            locator,
            queue,
            settings,
        }
    }

    /// Processes one webhook and its optional uploaded thumbnail.
    ///
    /// # Errors
    /// Only `DomainError::Validation`, when the payload fails the gate. No
    /// side effects have happened in that case.
    pub async fn ingest(&self, payload: &EventPayload, upload: Option<Bytes>) -> Result<IngestOutcome> {
        let event = classify(payload)?;
        debug!(event = ?payload.event, key = %event.key, "playback event received");

        let thumbnail = if event.phase.is_cacheable() {
            self.ensure_thumbnail(&event.key, upload).await
        } else {
            ThumbnailStatus::Skipped
        };

        let notification = match (event.media, event.phase.action()) {
            (MediaClass::Audio, _) => NotificationStatus::NotEligible,
            (MediaClass::Video, None) => NotificationStatus::NotNotifiable,
            (MediaClass::Video, Some(action)) => {
                let thumb_url = thumbnail.is_available().then(|| self.image_url(&event.key));
                self.notify(payload, action, thumb_url, &event.key).await
            }
        };

        Ok(IngestOutcome {
            key: event.key,
            media: event.media,
            phase: event.phase,
            thumbnail,
            notification,
        })
    }

    /// Public link to the cached thumbnail for `key`.
    pub fn image_url(&self, key: &CacheKey) -> String {
        format!(
            "{}/images/{}.jpg",
            self.settings.public_url.trim_end_matches('/'),
            key
        )
    }

    async fn ensure_thumbnail(&self, key: &CacheKey, upload: Option<Bytes>) -> ThumbnailStatus {
        match self.cache.exists(key).await {
            Ok(true) => {
                info!(%key, "using cached image");
                return ThumbnailStatus::Reused;
            }
            Ok(false) => {}
            Err(e) => warn!(%key, error = %e, "image cache lookup failed, treating as empty"),
        }

        let Some(raw) = upload.filter(|bytes| !bytes.is_empty()) else {
            return ThumbnailStatus::Missing;
        };

        let thumbnail = match self.processor.normalize(raw).await {
            Ok(thumbnail) => thumbnail,
            Err(e) => {
                warn!(%key, error = %e, "uploaded image could not be normalized");
                return ThumbnailStatus::Failed;
            }
        };

        info!(%key, "saving new image");
        match self
            .cache
            .set_with_expiry(key, thumbnail, self.settings.thumbnail_ttl_seconds)
            .await
        {
            Ok(()) => ThumbnailStatus::Stored,
            Err(e) => {
                warn!(%key, error = %e, "image cache write failed");
                ThumbnailStatus::Failed
            }
        }
    }

    async fn notify(
        &self,
        payload: &EventPayload,
        action: PlaybackAction,
        thumb_url: Option<String>,
        key: &CacheKey,
    ) -> NotificationStatus {
        let location = match payload.public_address() {
            Some(ip) => match self.locator.locate(ip).await {
                Ok(location) => location_text(&location),
                Err(e) => {
                    warn!(ip, error = %e, "location lookup failed");
                    None
                }
            },
            None => None,
        };

        if thumb_url.is_some() {
            info!(%key, "sending notification with image");
        } else {
            info!(%key, "sending notification without image");
        }

        let notification = self.compose(payload, action, thumb_url, location);
        match self.queue.enqueue(notification) {
            Ok(()) => NotificationStatus::Queued,
            Err(e) => {
                tracing::error!(%key, error = %e, "could not queue notification");
                NotificationStatus::Failed
            }
        }
    }

    fn compose(
        &self,
        payload: &EventPayload,
        action: PlaybackAction,
        thumb_url: Option<String>,
        location: Option<String>,
    ) -> Notification {
        let metadata = payload.metadata.clone().unwrap_or_default();
        let title = format_title(&metadata);

        let mut text = format!(
            "{} {} {}",
            payload.account_title().unwrap_or("Someone"),
            action.verb,
            title
        );
        if let Some(server) = payload.server_title() {
            text.push_str(" on ");
            text.push_str(server);
        }
        if let Some(location) = &location {
            text.push(' ');
            text.push_str(location);
        }

        Notification {
            username: self.settings.username.clone(),
            text,
            colour: action.colour,
            subtitle: format_subtitle(&metadata),
            title,
            thumb_url,
            footer: metadata.summary.filter(|s| !s.is_empty()),
            location,
        }
    }
}
