//! Shared fixtures for the relay's cross-crate tests: payload and multipart
//! builders, recording fakes for the outbound ports and a fully wired router
//! backed by the in-memory cache.

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use domains::{Clock, DomainError, Location, LocationLookup, Notification, Notifier, Result};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};

#[cfg(feature = "web-axum")]
pub mod app;

pub const SERVER_UUID: &str = "srv-1";
pub const RATING_KEY: &str = "2001";
pub const BOUNDARY: &str = "relay-test-boundary";

/// A webhook payload for a movie, as the media server sends it.
pub fn movie_event(event: &str) -> Value {
    json!({
        "event": event,
        "user": true,
        "owner": true,
        "Account": { "title": "alice" },
        "Server": { "title": "Den", "uuid": SERVER_UUID },
        "Player": { "title": "Living Room", "publicAddress": "203.0.113.9" },
        "Metadata": {
            "librarySectionType": "movie",
            "ratingKey": RATING_KEY,
            "type": "movie",
            "title": "Arrival",
            "year": 2016,
            "tagline": "Why are they here?",
            "summary": "A linguist works with the military."
        }
    })
}

/// A webhook payload for an album track.
pub fn track_event(event: &str) -> Value {
    json!({
        "event": event,
        "user": true,
        "Account": { "title": "alice" },
        "Server": { "title": "Den", "uuid": SERVER_UUID },
        "Metadata": {
            "librarySectionType": "artist",
            "ratingKey": 77,
            "type": "track",
            "title": "Teardrop",
            "parentTitle": "Mezzanine",
            "grandparentTitle": "Massive Attack"
        }
    })
}

/// Encodes a `multipart/form-data` body with the `payload` field and an
/// optional `thumb` file.
pub fn multipart_body(payload: &Value, thumb: Option<&[u8]>) -> Vec<u8> {
    multipart_raw(Some(&payload.to_string()), thumb)
}

/// Like [`multipart_body`] but the payload text is sent verbatim, or left out.
pub fn multipart_raw(payload: Option<&str>, thumb: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(payload) = payload {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"payload\"\r\n\r\n{payload}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(thumb) = thumb {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"thumb\"; filename=\"thumb.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(thumb);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// A solid-colour PNG.
pub fn png(width: u32, height: u32, colour: [u8; 3]) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(colour)))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("png encoding");
    buf
}

/// Keeps every notification it is asked to deliver.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier lock").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        self.sent.lock().expect("notifier lock").push(notification.clone());
        Ok(())
    }
}

/// Resolves every address to the same place.
pub struct StaticLookup(pub Location);

impl StaticLookup {
    pub fn austin() -> Self {
        Self(Location {
            city: "Austin".into(),
            region_name: "Texas".into(),
            country_name: "United States".into(),
            country_code: "US".into(),
        })
    }
}

#[async_trait]
impl LocationLookup for StaticLookup {
    async fn locate(&self, _ip: &str) -> Result<Location> {
        Ok(self.0.clone())
    }
}

/// A lookup service that is always down.
pub struct FailingLookup;

#[async_trait]
impl LocationLookup for FailingLookup {
    async fn locate(&self, _ip: &str) -> Result<Location> {
        Err(DomainError::infrastructure("geoip service unreachable"))
    }
}

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
        }
    }
}

impl ManualClock {
    pub fn advance(&self, by: TimeDelta) {
        *self.now.lock().expect("clock lock") += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}
