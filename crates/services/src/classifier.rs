//! # Event Classifier
//!
//! Decides what kind of event a payload is and renders the human-facing
//! strings used when it is announced.

use domains::{
    CacheKey, DomainError, EventPayload, LifecyclePhase, Location, MediaClass, Metadata, Result,
};

use crate::key::derive_cache_key;

/// Result of passing the presence and media-type gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEvent {
    pub media: MediaClass,
    pub phase: LifecyclePhase,
    pub key: CacheKey,
}

/// Rejects payloads the relay cannot act on, then derives the cache key.
pub fn classify(payload: &EventPayload) -> Result<ClassifiedEvent> {
    if !payload.has_user() {
        return Err(DomainError::validation("payload has no user"));
    }
    let metadata = payload
        .metadata
        .as_ref()
        .ok_or_else(|| DomainError::validation("payload has no Metadata"))?;
    let section = metadata.library_section_type.as_deref().unwrap_or_default();
    let media = MediaClass::from_library_section(section).ok_or_else(|| {
        DomainError::validation(format!("unsupported library section type {section:?}"))
    })?;

    let server_id = payload
        .server_uuid()
        .ok_or_else(|| DomainError::validation("payload has no Server.uuid"))?;
    let item_id = metadata
        .rating_key
        .as_deref()
        .ok_or_else(|| DomainError::validation("payload has no Metadata.ratingKey"))?;

    let phase = payload
        .event
        .as_deref()
        .map(LifecyclePhase::from_event)
        .unwrap_or(LifecyclePhase::Ignored);

    Ok(ClassifiedEvent {
        media,
        phase,
        key: derive_cache_key(server_id, item_id),
    })
}

/// Series name for episodes and tracks, otherwise the title with its year.
pub fn format_title(metadata: &Metadata) -> String {
    if let Some(grandparent) = present(&metadata.grandparent_title) {
        return grandparent.to_owned();
    }
    let mut title = present(&metadata.title).unwrap_or_default().to_owned();
    if let Some(year) = metadata.year {
        title.push_str(&format!(" ({year})"));
    }
    title
}

/// Second line of the attachment: album, episode number or air date, then the item title.
pub fn format_subtitle(metadata: &Metadata) -> String {
    if present(&metadata.grandparent_title).is_none() {
        return if metadata.kind.as_deref() == Some("movie") {
            present(&metadata.tagline).unwrap_or_default().to_owned()
        } else {
            String::new()
        };
    }

    let mut subtitle = if metadata.kind.as_deref() == Some("track") {
        present(&metadata.parent_title).unwrap_or_default().to_owned()
    } else if let (Some(index), Some(parent_index)) = (
        metadata.index.filter(|i| *i != 0),
        metadata.parent_index.filter(|i| *i != 0),
    ) {
        format!("S{parent_index} E{index}")
    } else {
        present(&metadata.originally_available_at)
            .unwrap_or_default()
            .to_owned()
    };

    if let Some(title) = present(&metadata.title) {
        subtitle.push_str(" - ");
        subtitle.push_str(title);
    }
    subtitle
}

/// `near Austin, Texas` for US addresses, `near Lyon, France` elsewhere.
pub fn location_text(location: &Location) -> Option<String> {
    let state = if location.country_code == "US" {
        &location.region_name
    } else {
        &location.country_name
    };
    let parts: Vec<&str> = [location.city.as_str(), state.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();
    (!parts.is_empty()).then(|| format!("near {}", parts.join(", ")))
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{Player, ServerInfo};
    use serde_json::json;

    fn payload(section: &str, event: &str) -> EventPayload {
        EventPayload {
            event: Some(event.into()),
            user: json!(true),
            metadata: Some(Metadata {
                library_section_type: Some(section.into()),
                rating_key: Some("1001".into()),
                ..Default::default()
            }),
            server: Some(ServerInfo {
                uuid: Some("server-1".into()),
                title: Some("Home".into()),
            }),
            player: Some(Player {
                public_address: Some("198.51.100.4".into()),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn classifies_video_and_audio() {
        let movie = classify(&payload("movie", "media.pause")).unwrap();
        assert_eq!(movie.media, MediaClass::Video);
        assert_eq!(movie.phase, LifecyclePhase::Pause);
        assert_eq!(movie.key, derive_cache_key("server-1", "1001"));

        let track = classify(&payload("artist", "media.play")).unwrap();
        assert_eq!(track.media, MediaClass::Audio);
    }

    #[test]
    fn unknown_event_is_ignored_not_rejected() {
        let event = classify(&payload("show", "library.on.deck")).unwrap();
        assert_eq!(event.phase, LifecyclePhase::Ignored);
    }

    #[test]
    fn rejects_missing_metadata() {
        let mut p = payload("movie", "media.play");
        p.metadata = None;
        assert!(matches!(classify(&p), Err(DomainError::Validation(_))));
    }

    #[test]
    fn rejects_missing_user() {
        let mut p = payload("movie", "media.play");
        p.user = json!(false);
        assert!(matches!(classify(&p), Err(DomainError::Validation(_))));
    }

    #[test]
    fn rejects_photo_libraries() {
        assert!(matches!(
            classify(&payload("photo", "media.play")),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn rejects_payloads_without_key_material() {
        let mut p = payload("movie", "media.play");
        p.server = None;
        assert!(matches!(classify(&p), Err(DomainError::Validation(_))));

        let mut p = payload("movie", "media.play");
        p.metadata.as_mut().unwrap().rating_key = None;
        assert!(matches!(classify(&p), Err(DomainError::Validation(_))));
    }

    #[test]
    fn movie_title_carries_year() {
        let metadata = Metadata {
            title: Some("Arrival".into()),
            year: Some(2016),
            ..Default::default()
        };
        assert_eq!(format_title(&metadata), "Arrival (2016)");
    }

    #[test]
    fn episode_title_is_the_show() {
        let metadata = Metadata {
            grandparent_title: Some("Show".into()),
            title: Some("Ep".into()),
            year: Some(2020),
            ..Default::default()
        };
        assert_eq!(format_title(&metadata), "Show");
    }

    #[test]
    fn episode_subtitle() {
        let metadata = Metadata {
            grandparent_title: Some("Show".into()),
            parent_index: Some(2),
            index: Some(5),
            title: Some("Ep".into()),
            ..Default::default()
        };
        assert_eq!(format_subtitle(&metadata), "S2 E5 - Ep");
    }

    #[test]
    fn track_subtitle_is_the_album() {
        let metadata = Metadata {
            kind: Some("track".into()),
            grandparent_title: Some("Artist".into()),
            parent_title: Some("Album".into()),
            title: Some("Song".into()),
            index: Some(3),
            parent_index: Some(1),
            ..Default::default()
        };
        assert_eq!(format_subtitle(&metadata), "Album - Song");
    }

    #[test]
    fn daily_show_subtitle_uses_air_date() {
        let metadata = Metadata {
            grandparent_title: Some("News".into()),
            originally_available_at: Some("2024-03-01".into()),
            ..Default::default()
        };
        assert_eq!(format_subtitle(&metadata), "2024-03-01");
    }

    #[test]
    fn season_zero_special_falls_back_to_air_date() {
        let metadata = Metadata {
            grandparent_title: Some("Doctor Who".into()),
            parent_index: Some(0),
            index: Some(3),
            originally_available_at: Some("2010-12-25".into()),
            title: Some("A Christmas Carol".into()),
            ..Default::default()
        };
        assert_eq!(format_subtitle(&metadata), "2010-12-25 - A Christmas Carol");
    }

    #[test]
    fn movie_subtitle_is_tagline() {
        let metadata = Metadata {
            kind: Some("movie".into()),
            title: Some("Arrival".into()),
            tagline: Some("Why are they here?".into()),
            ..Default::default()
        };
        assert_eq!(format_subtitle(&metadata), "Why are they here?");
        assert_eq!(format_subtitle(&Metadata::default()), "");
    }

    #[test]
    fn location_uses_region_only_in_the_us() {
        let us = Location {
            city: "Austin".into(),
            region_name: "Texas".into(),
            country_name: "United States".into(),
            country_code: "US".into(),
        };
        assert_eq!(location_text(&us).as_deref(), Some("near Austin, Texas"));

        let fr = Location {
            city: "Lyon".into(),
            region_name: "Auvergne-Rhone-Alpes".into(),
            country_name: "France".into(),
            country_code: "FR".into(),
        };
        assert_eq!(location_text(&fr).as_deref(), Some("near Lyon, France"));
        assert_eq!(location_text(&Location::default()), None);
    }
}
