use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A playback webhook as posted by the media server in the `payload` form field.
///
/// Every nested object is optional: the server omits whole sections depending
/// on the event kind, so presence is checked explicitly by the classifier
/// rather than assumed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Lifecycle phase name, e.g. `media.play`
    #[serde(default)]
    pub event: Option<String>,
    /// Presence flag; any JSON-truthy value counts
    #[serde(default)]
    pub user: Value,
    #[serde(rename = "Metadata", default)]
    pub metadata: Option<Metadata>,
    #[serde(rename = "Server", default)]
    pub server: Option<ServerInfo>,
    #[serde(rename = "Account", default)]
    pub account: Option<Account>,
    #[serde(rename = "Player", default)]
    pub player: Option<Player>,
}

impl EventPayload {
    /// `null`, `false`, `0` and `""` count as absent; anything else as present.
    pub fn has_user(&self) -> bool {
        match &self.user {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    pub fn server_uuid(&self) -> Option<&str> {
        self.server.as_ref().and_then(|s| s.uuid.as_deref())
    }

    pub fn server_title(&self) -> Option<&str> {
        self.server.as_ref().and_then(|s| s.title.as_deref())
    }

    pub fn account_title(&self) -> Option<&str> {
        self.account.as_ref().and_then(|a| a.title.as_deref())
    }

    pub fn public_address(&self) -> Option<&str> {
        self.player
            .as_ref()
            .and_then(|p| p.public_address.as_deref())
            .filter(|addr| !addr.is_empty())
    }
}

/// Describes the media item the event refers to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub library_section_type: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub rating_key: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub grandparent_title: Option<String>,
    #[serde(default)]
    pub parent_title: Option<String>,
    #[serde(default)]
    pub index: Option<i64>,
    #[serde(default)]
    pub parent_index: Option<i64>,
    #[serde(default)]
    pub originally_available_at: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    #[serde(default)]
    pub public_address: Option<String>,
}

// Rating keys arrive as strings from current servers and as integers from
// some older ones.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected string or number for ratingKey, got {other}"
        ))),
    }
}
