//! Identifier newtypes shared by every store adapter

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::path::{
    CHATS_ROOT, GROUP_CHAT_ROOT, GROUP_MESSAGES_NODE, StorePath, validate_segment,
};

/// Identifier of the single global group conversation
pub const GLOBAL_GROUP_ID: &str = "globalGroupChat";

/// Opaque user identifier issued by the authentication provider.
///
/// Deserialization does not re-validate: records written by other clients are read
/// as-is, and only identifiers this client produces go through [`UserId::new`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a user id, rejecting values that cannot be used as a path segment.
    pub fn new(id: impl Into<String>) -> Result<Self, StoreError> {
        let id = id.into();
        validate_segment(&id)?;
        Ok(Self(id))
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key of a record inside a collection, usually generated by the store on append.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    /// Creates a record key, rejecting values that cannot be used as a path segment.
    pub fn new(key: impl Into<String>) -> Result<Self, StoreError> {
        let key = key.into();
        validate_segment(&key)?;
        Ok(Self(key))
    }

    /// Borrow the raw key
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two kinds of conversation Palaver knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversationKind {
    /// A thread between exactly two users
    Direct,
    /// The single global group thread
    Group,
}

/// Identifier of a conversation and the place its messages live in the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConversationId {
    raw: String,
    group: bool,
}

impl ConversationId {
    /// Wraps an already-derived one-to-one conversation key.
    ///
    /// This does not derive anything; use the resolver in `palaver-core` to build the key
    /// from two participants.
    pub fn direct(raw: impl Into<String>) -> Result<Self, StoreError> {
        let raw = raw.into();
        validate_segment(&raw)?;
        Ok(Self { raw, group: false })
    }

    /// The global group conversation.
    pub fn group() -> Self {
        Self {
            raw: GLOBAL_GROUP_ID.to_string(),
            group: true,
        }
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Which kind of conversation this is
    pub fn kind(&self) -> ConversationKind {
        if self.group {
            ConversationKind::Group
        } else {
            ConversationKind::Direct
        }
    }

    /// Whether this is the group conversation
    pub fn is_group(&self) -> bool {
        self.group
    }

    /// The node this conversation's messages are stored under.
    ///
    /// - direct: `chats/{id}`
    /// - group: `GroupChat/{id}/messages`
    pub fn messages_path(&self) -> StorePath {
        if self.group {
            StorePath::from_trusted(&[GROUP_CHAT_ROOT, &self.raw, GROUP_MESSAGES_NODE])
        } else {
            self.root_path()
        }
    }

    /// The top-level node of this conversation.
    ///
    /// For direct conversations this is the same as [`Self::messages_path`].
    pub fn root_path(&self) -> StorePath {
        let root = if self.group {
            GROUP_CHAT_ROOT
        } else {
            CHATS_ROOT
        };
        StorePath::from_trusted(&[root, &self.raw])
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
