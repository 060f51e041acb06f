use serde::{Deserialize, Serialize};

use super::Colour;

/// Approximate whereabouts of a viewer's public address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub region_name: String,
    #[serde(default)]
    pub country_name: String,
    #[serde(default)]
    pub country_code: String,
}

/// A finished chat message, ready to hand to a `Notifier`.
///
/// `text` is the line every notifier sends; the remaining fields make up
/// the optional rich attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Display name the message is posted under
    pub username: String,
    pub text: String,
    pub colour: Colour,
    pub title: String,
    pub subtitle: String,
    /// Link to the cached thumbnail, when one exists for the item
    pub thumb_url: Option<String>,
    pub footer: Option<String>,
    pub location: Option<String>,
}
