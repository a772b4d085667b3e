//! Persisted record layouts
//!
//! These are the JSON shapes other clients of the same backend read and write, so field
//! names are fixed (`camelCase`) and optional fields are tolerated on read.

use serde::{Deserialize, Serialize};

use crate::ids::UserId;
use crate::timestamp::Timestamp;

/// A shared geographic position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Precomputed map link for the position
    pub link: String,
}

/// A one-to-one message as stored under `chats/{conversation}/{key}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    /// Text body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Download URL of an attached file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    /// Original name of the attached file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Shared position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Client time at which the sender composed the message
    pub created_at: Timestamp,
    /// Author
    pub user_id: UserId,
    /// Author display name at send time
    #[serde(default)]
    pub user_name: String,
    /// Author avatar URL at send time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_avatar: Option<String>,
    /// Whether the recipient has seen the message. Only ever goes from `false` to `true`.
    #[serde(default)]
    pub seen: bool,
}

impl MessageRecord {
    /// Whether the record carries any content at all
    pub fn has_payload(&self) -> bool {
        self.text.is_some() || self.file_url.is_some() || self.location.is_some()
    }
}

/// Sender identity duplicated into every group message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderSnapshot {
    /// Author
    pub user_id: UserId,
    /// Author display name at send time
    #[serde(default)]
    pub user_name: String,
    /// Author avatar URL at send time, when the client recorded one
    #[serde(
        default,
        rename = "photoURL",
        skip_serializing_if = "Option::is_none"
    )]
    pub photo_url: Option<String>,
}

/// Payload of a group message. Absent parts are stored as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupContent {
    /// Text body
    #[serde(default)]
    pub text: Option<String>,
    /// Original name of the attached file
    #[serde(default)]
    pub file_name: Option<String>,
    /// Download URL of an attached file
    #[serde(default)]
    pub file_url: Option<String>,
    /// Shared position
    #[serde(default)]
    pub location: Option<Location>,
}

/// A group message as stored under `GroupChat/{group}/messages/{key}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessageRecord {
    /// Author
    pub user_id: UserId,
    /// Author snapshot taken at send time
    pub sender: SenderSnapshot,
    /// Message payload
    #[serde(default)]
    pub content: GroupContent,
    /// Client time at which the sender composed the message
    pub created_at: Timestamp,
}

/// A user profile as stored under `profiles/{user}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    /// Owner of the profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<UserId>,
    /// Full name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nom: Option<String>,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pseudo: Option<String>,
    /// Phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    /// Presence flag
    #[serde(default)]
    pub is_connected: bool,
}
