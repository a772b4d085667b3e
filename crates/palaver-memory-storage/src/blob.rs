//! Memory-based implementation of the blob store

use std::collections::BTreeMap;

use palaver_storage_traits::{BlobPath, BlobStore, StoreError};
use parking_lot::RwLock;

/// Default base URL download links are built from
pub const DEFAULT_BASE_URL: &str = "memory://blobs";

/// An object held by [`MemoryBlobStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Object content
    pub bytes: Vec<u8>,
    /// MIME type given at upload
    pub content_type: String,
}

/// An in-memory object store.
#[derive(Debug)]
pub struct MemoryBlobStore {
    base_url: String,
    objects: RwLock<BTreeMap<String, StoredBlob>>,
    failure: RwLock<Option<StoreError>>,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBlobStore {
    /// Creates an empty store serving links under [`DEFAULT_BASE_URL`].
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates an empty store serving links under `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: RwLock::new(BTreeMap::new()),
            failure: RwLock::new(None),
        }
    }

    /// Makes every upload fail with `error` until [`Self::clear_failure`] is called.
    pub fn fail_uploads(&self, error: StoreError) {
        *self.failure.write() = Some(error);
    }

    /// Lets uploads succeed again.
    pub fn clear_failure(&self) {
        *self.failure.write() = None;
    }

    /// Fetches a stored object.
    pub fn object(&self, path: &str) -> Option<StoredBlob> {
        self.objects.read().get(path).cloned()
    }

    /// Names of every stored object, sorted.
    pub fn object_names(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    fn url_for(&self, path: &BlobPath) -> String {
        format!("{}/{}", self.base_url, path.as_str().replace(' ', "%20"))
    }
}

impl BlobStore for MemoryBlobStore {
    fn upload(
        &self,
        path: &BlobPath,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError> {
        if let Some(error) = self.failure.read().clone() {
            tracing::debug!(target: "palaver_memory_storage", "Rejecting upload of {}", path);
            return Err(error);
        }

        self.objects.write().insert(
            path.as_str().to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(self.url_for(path))
    }
}
