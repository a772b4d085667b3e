//! Blob store module
//!
//! Attachments and avatars live in an object store addressed by `/`-separated names.
//! Objects are upserted: uploading to an existing name replaces it.

use std::fmt;

use crate::error::StoreError;

/// Folder for one-to-one attachments
pub const CHAT_FILES_PREFIX: &str = "chat_files";
/// Folder for group attachments
pub const GROUP_FILES_PREFIX: &str = "GroupChatFiles";
/// Folder for profile images
pub const PROFILE_IMAGES_PREFIX: &str = "profiles";

/// Name of an object in the blob store
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlobPath(String);

impl BlobPath {
    /// `{prefix}/{name}`.
    ///
    /// `name` must be a single component: non-empty and without `/` or `\`.
    pub fn new(prefix: &str, name: &str) -> Result<Self, StoreError> {
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(StoreError::InvalidPath(format!(
                "blob name {name:?} must be a single non-empty component"
            )));
        }
        if prefix.is_empty() {
            return Ok(Self(name.to_string()));
        }
        Ok(Self(format!("{}/{name}", prefix.trim_end_matches('/'))))
    }

    /// Borrow the full object name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage trait for the blob store
pub trait BlobStore: Send + Sync {
    /// Upload `bytes` to `path`, replacing any existing object.
    ///
    /// Returns the public download URL of the stored object. The object is complete
    /// and readable once this returns `Ok`.
    fn upload(
        &self,
        path: &BlobPath,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError>;
}
