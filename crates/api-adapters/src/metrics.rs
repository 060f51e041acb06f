//! Prometheus counters for the ingest pipeline, rendered in the text
//! exposition format on `GET /metrics`.

use std::fmt;

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;
use services::{IngestOutcome, NotificationStatus, ThumbnailStatus};

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct PhaseLabels {
    phase: String,
}

pub struct Metrics {
    registry: Registry,
    events: Family<PhaseLabels, Counter>,
    events_rejected: Counter,
    thumbnails_stored: Counter,
    thumbnails_reused: Counter,
    notifications_queued: Counter,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("playback_relay");

        let events = Family::<PhaseLabels, Counter>::default();
        registry.register("events", "Accepted playback events by phase", events.clone());

        let events_rejected = Counter::default();
        registry.register(
            "events_rejected",
            "Events that failed validation",
            events_rejected.clone(),
        );

        let thumbnails_stored = Counter::default();
        registry.register(
            "thumbnails_stored",
            "Uploads normalized and written to the image cache",
            thumbnails_stored.clone(),
        );

        let thumbnails_reused = Counter::default();
        registry.register(
            "thumbnails_reused",
            "Events served by an already cached thumbnail",
            thumbnails_reused.clone(),
        );

        let notifications_queued = Counter::default();
        registry.register(
            "notifications_queued",
            "Notifications handed to the dispatch worker",
            notifications_queued.clone(),
        );

        Self {
            registry,
            events,
            events_rejected,
            thumbnails_stored,
            thumbnails_reused,
            notifications_queued,
        }
    }

    pub fn observe(&self, outcome: &IngestOutcome) {
        self.events
            .get_or_create(&PhaseLabels {
                phase: outcome.phase.as_str().to_string(),
            })
            .inc();

        match outcome.thumbnail {
            ThumbnailStatus::Stored => {
                self.thumbnails_stored.inc();
            }
            ThumbnailStatus::Reused => {
                self.thumbnails_reused.inc();
            }
            _ => {}
        }

        if outcome.notification == NotificationStatus::Queued {
            self.notifications_queued.inc();
        }
    }

    pub fn reject(&self) {
        self.events_rejected.inc();
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();
        encode(&mut buf, &self.registry)?;
        Ok(buf)
    }
}
