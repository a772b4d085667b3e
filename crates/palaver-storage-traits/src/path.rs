//! Store paths
//!
//! The document store is a tree addressed by `/`-separated segments. Segment rules follow
//! the hosted realtime databases Palaver targets: non-empty, and none of `. # $ [ ] /`.

use std::fmt;

use crate::error::StoreError;
use crate::ids::{RecordKey, UserId};

/// Root node holding one-to-one conversations
pub const CHATS_ROOT: &str = "chats";
/// Root node holding the group conversation tree
pub const GROUP_CHAT_ROOT: &str = "GroupChat";
/// Child of a group conversation node holding its messages
pub const GROUP_MESSAGES_NODE: &str = "messages";
/// Root node holding user profiles
pub const PROFILES_ROOT: &str = "profiles";

const FORBIDDEN_SEGMENT_CHARS: [char; 6] = ['/', '.', '#', '$', '[', ']'];

/// Checks that `segment` can be used as a single path segment.
pub fn validate_segment(segment: &str) -> Result<(), StoreError> {
    if segment.is_empty() {
        return Err(StoreError::InvalidPath("empty path segment".to_string()));
    }
    if let Some(c) = segment.chars().find(|c| FORBIDDEN_SEGMENT_CHARS.contains(c)) {
        return Err(StoreError::InvalidPath(format!(
            "segment {segment:?} contains forbidden character {c:?}"
        )));
    }
    if segment.chars().any(char::is_control) {
        return Err(StoreError::InvalidPath(format!(
            "segment {segment:?} contains a control character"
        )));
    }
    Ok(())
}

/// A validated path into the document store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// The root of the store.
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parses a `/`-separated path. Leading and trailing separators are ignored.
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        for segment in trimmed.split('/') {
            validate_segment(segment)?;
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    pub(crate) fn from_trusted(segments: &[&str]) -> Self {
        Self {
            segments: segments.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Returns a new path with `segment` appended.
    pub fn child(&self, segment: &str) -> Result<Self, StoreError> {
        validate_segment(segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    /// Returns the path of a record stored under this collection.
    ///
    /// Record keys are validated at construction so this cannot fail.
    pub fn record(&self, key: &RecordKey) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key.as_str().to_string());
        Self { segments }
    }

    /// `profiles/{user}`
    pub fn profile(user: &UserId) -> Self {
        Self {
            segments: vec![PROFILES_ROOT.to_string(), user.as_str().to_string()],
        }
    }

    /// `profiles`
    pub fn profiles() -> Self {
        Self {
            segments: vec![PROFILES_ROOT.to_string()],
        }
    }

    /// `chats`
    pub fn chats() -> Self {
        Self {
            segments: vec![CHATS_ROOT.to_string()],
        }
    }

    /// Path segments, root first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this is the store root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether `self` equals `other` or lies above it in the tree.
    pub fn is_ancestor_of(&self, other: &StorePath) -> bool {
        self.segments.len() <= other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|(a, b)| a == b)
    }

    /// Whether a write at `self` can change the value observed at `other`.
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self.is_ancestor_of(other) || other.is_ancestor_of(self)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path = StorePath::parse("/chats/a_b/").unwrap();
        assert_eq!(path.segments(), &["chats".to_string(), "a_b".to_string()]);
        assert_eq!(path.to_string(), "chats/a_b");
        assert!(StorePath::parse("").unwrap().is_root());
    }

    #[test]
    fn test_forbidden_segments() {
        assert!(StorePath::parse("chats//x").is_err());
        assert!(StorePath::parse("chats/a.b").is_err());
        assert!(StorePath::parse("chats/a#b").is_err());
        assert!(StorePath::parse("chats/$a").is_err());
        assert!(StorePath::parse("chats/[a]").is_err());
        assert!(StorePath::root().child("a/b").is_err());
        assert!(validate_segment("tab\there").is_err());
    }

    #[test]
    fn test_ancestry() {
        let chats = StorePath::chats();
        let conv = chats.child("a_b").unwrap();
        let other = StorePath::parse("profiles/a").unwrap();

        assert!(chats.is_ancestor_of(&conv));
        assert!(conv.is_ancestor_of(&conv));
        assert!(!conv.is_ancestor_of(&chats));
        assert!(StorePath::root().is_ancestor_of(&conv));

        assert!(conv.overlaps(&chats));
        assert!(chats.overlaps(&conv));
        assert!(!conv.overlaps(&other));
    }
}
