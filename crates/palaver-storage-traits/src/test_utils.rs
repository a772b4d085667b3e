//! Test utilities for Palaver storage
//!
//! Builders for records with sensible defaults, shared by the adapter and core test
//! suites.

#![allow(missing_docs)]

use serde_json::Value;

use crate::ids::UserId;
use crate::records::{GroupContent, GroupMessageRecord, MessageRecord, SenderSnapshot};
use crate::timestamp::Timestamp;

/// Parses a user id, panicking on invalid input
pub fn user(id: &str) -> UserId {
    UserId::new(id).expect("valid test user id")
}

/// A timestamp `offset_secs` seconds after a fixed base instant
pub fn at(offset_secs: i64) -> Timestamp {
    Timestamp::from_millis(1_733_000_000_000 + offset_secs * 1_000).expect("valid test time")
}

/// A one-to-one text record
pub fn text_record(author: &str, text: &str, offset_secs: i64, seen: bool) -> MessageRecord {
    MessageRecord {
        text: Some(text.to_string()),
        file_url: None,
        file_name: None,
        location: None,
        created_at: at(offset_secs),
        user_id: user(author),
        user_name: format!("{author}-name"),
        user_avatar: None,
        seen,
    }
}

/// A group text record
pub fn group_text_record(author: &str, text: &str, offset_secs: i64) -> GroupMessageRecord {
    GroupMessageRecord {
        user_id: user(author),
        sender: SenderSnapshot {
            user_id: user(author),
            user_name: format!("{author}-name"),
            photo_url: None,
        },
        content: GroupContent {
            text: Some(text.to_string()),
            ..Default::default()
        },
        created_at: at(offset_secs),
    }
}

/// Serializes a record into the JSON value stored for it
pub fn to_value<T: serde::Serialize>(record: &T) -> Value {
    serde_json::to_value(record).expect("serializable test record")
}
