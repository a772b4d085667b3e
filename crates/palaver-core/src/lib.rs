//! Realtime conversation sync for Palaver chat clients
//!
//! This crate keeps a live, ordered view of a conversation on top of a realtime
//! document store, writes read receipts for the focused conversation, and turns
//! composed messages (text, attachments, locations) into persisted records.
//! It is written against the traits from `palaver-storage-traits`, so any store adapter
//! (a hosted realtime database client, or the in-memory store used in tests) can back it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]
#![doc = include_str!("../README.md")]

use std::sync::Arc;

use palaver_storage_traits::{BlobStore, DocumentStore};
use tokio::runtime::Handle;

pub mod config;
pub mod conversation;
pub mod dispatch;
pub mod error;
pub mod group;
pub mod inbox;
pub mod logging;
pub mod prelude;
pub mod profiles;
pub mod projection;
pub mod sync;
#[cfg(test)]
pub mod test_util;

pub use self::config::PalaverConfig;
pub use self::error::Error;

/// Palaver result
pub type Result<T, E = Error> = std::result::Result<T, E>;

// Re-export the identifiers callers need for every operation
pub use palaver_storage_traits::{ConversationId, RecordKey, UserId};

/// Builder for constructing [`Palaver`] instances
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
///
/// use palaver_core::{Palaver, PalaverConfig};
/// use palaver_memory_storage::{MemoryBlobStore, MemoryStore};
///
/// let palaver = Palaver::builder(Arc::new(MemoryStore::new()), Arc::new(MemoryBlobStore::new()))
///     .with_config(PalaverConfig::new())
///     .build();
/// assert!(palaver.config().coalesce_snapshots);
/// ```
#[derive(Debug)]
pub struct PalaverBuilder<Store, Blobs> {
    store: Arc<Store>,
    blobs: Arc<Blobs>,
    config: PalaverConfig,
    runtime: Option<Handle>,
}

impl<Store, Blobs> PalaverBuilder<Store, Blobs>
where
    Store: DocumentStore + 'static,
    Blobs: BlobStore,
{
    /// Create a new builder over the given stores
    pub fn new(store: Arc<Store>, blobs: Arc<Blobs>) -> Self {
        Self {
            store,
            blobs,
            config: PalaverConfig::default(),
            runtime: None,
        }
    }

    /// Set a custom configuration
    pub fn with_config(mut self, config: PalaverConfig) -> Self {
        self.config = config;
        self
    }

    /// Run subscriptions on `runtime` instead of the runtime current at subscribe time
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the instance
    pub fn build(self) -> Palaver<Store, Blobs> {
        Palaver {
            store: self.store,
            blobs: self.blobs,
            config: self.config,
            runtime: self.runtime,
        }
    }
}

/// A chat client's view of the shared store.
///
/// Several instances may share one store: every write goes through the store, and
/// every instance only learns about changes through its watches. Cloning is cheap.
#[derive(Debug)]
pub struct Palaver<Store, Blobs> {
    store: Arc<Store>,
    blobs: Arc<Blobs>,
    config: PalaverConfig,
    runtime: Option<Handle>,
}

impl<Store, Blobs> Clone for Palaver<Store, Blobs> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            blobs: Arc::clone(&self.blobs),
            config: self.config.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<Store, Blobs> Palaver<Store, Blobs>
where
    Store: DocumentStore + 'static,
    Blobs: BlobStore,
{
    /// Construct with the default configuration
    pub fn new(store: Arc<Store>, blobs: Arc<Blobs>) -> Self {
        Self::builder(store, blobs).build()
    }

    /// Create a builder
    pub fn builder(store: Arc<Store>, blobs: Arc<Blobs>) -> PalaverBuilder<Store, Blobs> {
        PalaverBuilder::new(store, blobs)
    }

    /// Active configuration
    pub fn config(&self) -> &PalaverConfig {
        &self.config
    }

    /// The document store
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// The blob store
    pub fn blobs(&self) -> &Arc<Blobs> {
        &self.blobs
    }

    fn runtime(&self) -> Result<Handle> {
        if let Some(handle) = &self.runtime {
            return Ok(handle.clone());
        }
        Handle::try_current().map_err(|e| Error::Runtime(e.to_string()))
    }
}
