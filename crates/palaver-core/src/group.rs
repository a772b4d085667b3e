//! Global group chat setup

use palaver_storage_traits::{BlobStore, ConversationId, DocumentStore, Timestamp};
use serde_json::json;

use crate::{Palaver, Result};

impl<Store, Blobs> Palaver<Store, Blobs>
where
    Store: DocumentStore + 'static,
    Blobs: BlobStore,
{
    /// Creates the group conversation node if it does not exist yet.
    ///
    /// Returns whether it was created. An existing node, messages included, is left
    /// untouched.
    pub fn ensure_group_chat(&self) -> Result<bool> {
        let root = ConversationId::group().root_path();
        if self.store.get(&root)?.is_some() {
            tracing::debug!(target: "palaver_core::group", "Group chat already exists");
            return Ok(false);
        }

        self.store
            .set(&root, json!({ "createdAt": Timestamp::now().to_iso_string() }))?;
        tracing::info!(target: "palaver_core::group", "Created group chat at {}", root);
        Ok(true)
    }
}
