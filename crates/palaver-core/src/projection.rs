//! Snapshot projection
//!
//! Turns the unordered key/record mapping a watch delivers into the ordered,
//! newest-first sequence a conversation view renders. Projection is a pure function of
//! the snapshot: the same snapshot always yields the same sequence.
//!
//! Records are ordered by their own `createdAt`, ties broken by the store key. Store
//! iteration order is never trusted.

use palaver_storage_traits::records::Location;
use palaver_storage_traits::{
    GroupMessageRecord, MessageRecord, RecordKey, Snapshot, Timestamp, UserId,
};
use serde::de::DeserializeOwned;

/// Who authored a display message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySender {
    /// Author
    pub user_id: UserId,
    /// Display name recorded at send time
    pub user_name: String,
    /// Avatar recorded at send time
    pub avatar: Option<String>,
}

/// An attached file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedFile {
    /// Original file name
    pub name: Option<String>,
    /// Download URL
    pub url: String,
}

/// The payload of one raw record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageContent {
    /// Text body
    pub text: Option<String>,
    /// Attached file
    pub file: Option<AttachedFile>,
    /// Shared position
    pub location: Option<Location>,
}

/// One or more consecutive records from the same sender, as shown in a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayMessage {
    /// Store keys of the folded records, oldest first
    pub keys: Vec<RecordKey>,
    /// Author of every folded record
    pub sender: DisplaySender,
    /// Time of the first folded record
    pub created_at: Timestamp,
    /// Payload of each folded record, oldest first
    pub contents: Vec<MessageContent>,
    /// Whether every folded record has been seen. `None` for group messages, which
    /// carry no receipts.
    pub seen: Option<bool>,
}

impl DisplayMessage {
    /// Text bodies of the folded records, oldest first
    pub fn texts(&self) -> Vec<&str> {
        self.contents
            .iter()
            .filter_map(|content| content.text.as_deref())
            .collect()
    }
}

/// Decodes every record of a snapshot, skipping the ones that do not parse.
pub fn decode_records<T>(snapshot: &Snapshot) -> Vec<(RecordKey, T)>
where
    T: DeserializeOwned,
{
    let Some(children) = snapshot.children() else {
        if snapshot.exists() {
            tracing::warn!(
                target: "palaver_core::projection",
                "Ignoring non-collection value at {}",
                snapshot.path
            );
        }
        return Vec::new();
    };

    let mut records = Vec::with_capacity(children.len());
    for (key, value) in children {
        let Ok(key) = RecordKey::new(key.as_str()) else {
            continue;
        };
        match serde_json::from_value::<T>(value.clone()) {
            Ok(record) => records.push((key, record)),
            Err(e) => {
                tracing::warn!(
                    target: "palaver_core::projection",
                    "Skipping malformed record {} at {}: {}",
                    key,
                    snapshot.path,
                    e
                );
            }
        }
    }
    records
}

/// Projects one-to-one records: consecutive records from the same sender fold into one
/// display message. Returned newest first.
pub fn project_direct(mut records: Vec<(RecordKey, MessageRecord)>) -> Vec<DisplayMessage> {
    records.sort_by(|(ka, a), (kb, b)| a.created_at.cmp(&b.created_at).then_with(|| ka.cmp(kb)));

    let mut messages: Vec<DisplayMessage> = Vec::new();
    for (key, record) in records {
        let content = MessageContent {
            text: record.text,
            file: record.file_url.map(|url| AttachedFile {
                name: record.file_name,
                url,
            }),
            location: record.location,
        };

        if let Some(last) = messages.last_mut()
            && last.sender.user_id == record.user_id
        {
            last.keys.push(key);
            last.contents.push(content);
            last.seen = Some(last.seen.unwrap_or(true) && record.seen);
            continue;
        }

        messages.push(DisplayMessage {
            keys: vec![key],
            sender: DisplaySender {
                user_id: record.user_id,
                user_name: record.user_name,
                avatar: record.user_avatar,
            },
            created_at: record.created_at,
            contents: vec![content],
            seen: Some(record.seen),
        });
    }

    messages.reverse();
    messages
}

/// Projects group records, one display message each. Returned newest first.
pub fn project_group(mut records: Vec<(RecordKey, GroupMessageRecord)>) -> Vec<DisplayMessage> {
    records.sort_by(|(ka, a), (kb, b)| a.created_at.cmp(&b.created_at).then_with(|| ka.cmp(kb)));

    records
        .into_iter()
        .rev()
        .map(|(key, record)| {
            let content = record.content;
            DisplayMessage {
                keys: vec![key],
                sender: DisplaySender {
                    user_id: record.user_id,
                    user_name: record.sender.user_name,
                    avatar: record.sender.photo_url,
                },
                created_at: record.created_at,
                contents: vec![MessageContent {
                    text: content.text,
                    file: content.file_url.map(|url| AttachedFile {
                        name: content.file_name,
                        url,
                    }),
                    location: content.location,
                }],
                seen: None,
            }
        })
        .collect()
}
