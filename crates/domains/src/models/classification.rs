use serde::Serialize;

/// Lifecycle phase of a playback event.
///
/// Only the four playback transitions carry meaning for the relay; every
/// other event name (library scans, ratings, new-content notices) collapses
/// into `Ignored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    Play,
    Stop,
    Pause,
    Resume,
    Ignored,
}

impl LifecyclePhase {
    pub fn from_event(name: &str) -> Self {
        match name {
            "media.play" => Self::Play,
            "media.stop" => Self::Stop,
            "media.pause" => Self::Pause,
            "media.resume" => Self::Resume,
            _ => Self::Ignored,
        }
    }

    /// Phases that may store or reuse a thumbnail.
    pub fn is_cacheable(self) -> bool {
        !matches!(self, Self::Ignored)
    }

    /// Phases that produce a chat notification for video items.
    pub fn action(self) -> Option<PlaybackAction> {
        let (verb, colour) = match self {
            Self::Play => ("started watching", Colour::Good),
            Self::Stop => ("stopped watching", Colour::Danger),
            Self::Resume => ("resumed playback of", Colour::Good),
            Self::Pause => ("paused playback of", Colour::Warning),
            Self::Ignored => return None,
        };
        Some(PlaybackAction { verb, colour })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Stop => "stop",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Ignored => "ignored",
        }
    }
}

/// Whether an item is something you watch or something you listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaClass {
    Video,
    Audio,
}

impl MediaClass {
    /// `None` for library sections the relay does not handle (photos, unknown).
    pub fn from_library_section(section: &str) -> Option<Self> {
        match section {
            "movie" | "show" => Some(Self::Video),
            "artist" => Some(Self::Audio),
            _ => None,
        }
    }

    pub fn is_video(self) -> bool {
        matches!(self, Self::Video)
    }
}

/// Attachment colour. `Danger` is a named colour understood by Slack-style
/// webhook endpoints, the others are literal hex values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Colour {
    Good,
    Danger,
    Warning,
}

impl Colour {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Good => "#36a64f",
            Self::Danger => "danger",
            Self::Warning => "#a67a2d",
        }
    }
}

/// What the viewer did, as it reads in the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackAction {
    pub verb: &'static str,
    pub colour: Colour,
}
