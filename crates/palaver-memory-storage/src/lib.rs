//! Memory-based store implementations for Palaver.
//!
//! This crate provides [`MemoryStore`], an in-memory realtime document store, and
//! [`MemoryBlobStore`], an in-memory object store. Both implement the traits from
//! `palaver-storage-traits`, so the core can run end to end without a hosted backend.
//!
//! State is non-persistent and is cleared when the value is dropped. It is meant for
//! tests, demos, and offline development.
//!
//! # Watch semantics
//!
//! A watch receives the current value immediately, then one snapshot per write that
//! actually changes the value at the watched path. Snapshots are sent while the store
//! lock is held, so every watcher observes writes in the order they were applied.
//!
//! # Fault injection
//!
//! Tests can deny reads or writes below a path with [`AccessRules`], revoke access
//! from active watches, and make the next writes fail with a chosen [`StoreError`]:
//!
//! ```rust
//! use palaver_memory_storage::MemoryStore;
//! use palaver_storage_traits::{StoreError, StorePath};
//!
//! let store = MemoryStore::new();
//! store.deny_reads(StorePath::parse("chats/secret").unwrap());
//! store.fail_next_write(StoreError::Unavailable("offline".to_string()));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use palaver_storage_traits::{
    DocumentStore, PushIdGenerator, RecordKey, Snapshot, StoreError, StorePath, Watch,
    WatchEvent, WatchId,
};
use parking_lot::RwLock;
use serde_json::{Map, Value};

mod access;
mod blob;
mod tree;

pub use self::access::AccessRules;
pub use self::blob::{MemoryBlobStore, StoredBlob};

struct Watcher {
    path: StorePath,
    tx: flume::Sender<WatchEvent>,
}

/// Unified storage container
struct MemoryStoreInner {
    root: Map<String, Value>,
    watchers: BTreeMap<WatchId, Watcher>,
    rules: AccessRules,
    pending_write_failures: VecDeque<StoreError>,
}

/// An in-memory realtime document store.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
    keys: PushIdGenerator,
    next_watch_id: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("MemoryStore")
            .field("top_level_nodes", &inner.root.len())
            .field("watchers", &inner.watchers.len())
            .field("rules", &inner.rules)
            .finish()
    }
}

impl MemoryStore {
    /// Creates an empty store with no access restrictions.
    pub fn new() -> Self {
        Self::with_rules(AccessRules::default())
    }

    /// Creates an empty store enforcing `rules`.
    pub fn with_rules(rules: AccessRules) -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                root: Map::new(),
                watchers: BTreeMap::new(),
                rules,
                pending_write_failures: VecDeque::new(),
            }),
            keys: PushIdGenerator::new(),
            next_watch_id: AtomicU64::new(1),
        }
    }

    /// Denies reads at and below `path`.
    ///
    /// Active watches covered by the rule receive a single
    /// [`StoreError::PermissionDenied`] and are closed.
    pub fn deny_reads(&self, path: StorePath) {
        let mut inner = self.inner.write();
        inner.rules.deny_read(path.clone());

        let revoked: Vec<WatchId> = inner
            .watchers
            .iter()
            .filter(|(_, watcher)| path.is_ancestor_of(&watcher.path))
            .map(|(id, _)| *id)
            .collect();
        for id in revoked {
            if let Some(watcher) = inner.watchers.remove(&id) {
                tracing::debug!(
                    target: "palaver_memory_storage",
                    "Revoking watch {:?} on {}",
                    id,
                    watcher.path
                );
                let _ = watcher.tx.send(Err(StoreError::PermissionDenied(format!(
                    "read access to {} revoked",
                    watcher.path
                ))));
            }
        }
    }

    /// Denies writes at and below `path`.
    pub fn deny_writes(&self, path: StorePath) {
        self.inner.write().rules.deny_write(path);
    }

    /// Lifts every access restriction.
    pub fn clear_rules(&self) {
        self.inner.write().rules = AccessRules::default();
    }

    /// Makes the next write fail with `error` without applying it.
    ///
    /// Calls queue up: each write consumes one injected failure.
    pub fn fail_next_write(&self, error: StoreError) {
        self.inner.write().pending_write_failures.push_back(error);
    }

    /// Number of currently registered watches.
    pub fn active_watches(&self) -> usize {
        self.inner.read().watchers.len()
    }

    fn apply_write<F>(&self, path: &StorePath, write: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Map<String, Value>) -> Result<(), StoreError>,
    {
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        if let Some(error) = inner.pending_write_failures.pop_front() {
            return Err(error);
        }
        inner.rules.check_write(path)?;

        let before: Vec<(WatchId, Option<Value>)> = inner
            .watchers
            .iter()
            .filter(|(_, watcher)| watcher.path.overlaps(path))
            .map(|(id, watcher)| (*id, tree::get_at(&inner.root, &watcher.path)))
            .collect();

        write(&mut inner.root)?;

        let mut disconnected = Vec::new();
        for (id, previous) in before {
            let Some(watcher) = inner.watchers.get(&id) else {
                continue;
            };
            let current = tree::get_at(&inner.root, &watcher.path);
            if current == previous {
                continue;
            }
            let snapshot = Snapshot {
                path: watcher.path.clone(),
                value: current,
            };
            if watcher.tx.send(Ok(snapshot)).is_err() {
                disconnected.push(id);
            }
        }
        for id in disconnected {
            inner.watchers.remove(&id);
        }

        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, path: &StorePath) -> Result<Option<Value>, StoreError> {
        let inner = self.inner.read();
        inner.rules.check_read(path)?;
        Ok(tree::get_at(&inner.root, path))
    }

    fn set(&self, path: &StorePath, value: Value) -> Result<(), StoreError> {
        let value = tree::normalize(value)?;
        self.apply_write(path, |root| tree::set_at(root, path, value))
    }

    fn update(&self, path: &StorePath, fields: Map<String, Value>) -> Result<(), StoreError> {
        let mut children = Vec::with_capacity(fields.len());
        for (key, value) in fields {
            let child = path.child(&key)?;
            children.push((child, tree::normalize(value)?));
        }
        self.apply_write(path, |root| {
            for (child, value) in children {
                tree::set_at(root, &child, value)?;
            }
            Ok(())
        })
    }

    fn push(&self, path: &StorePath, value: Value) -> Result<RecordKey, StoreError> {
        let key = self.keys.next_key()?;
        let record_path = path.record(&key);
        let value = tree::normalize(value)?;
        self.apply_write(&record_path, |root| tree::set_at(root, &record_path, value))?;
        Ok(key)
    }

    fn watch(&self, path: &StorePath) -> Result<Watch, StoreError> {
        let mut inner = self.inner.write();
        inner.rules.check_read(path)?;

        let id = WatchId(self.next_watch_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = flume::unbounded();
        let initial = Snapshot {
            path: path.clone(),
            value: tree::get_at(&inner.root, path),
        };
        // The receiver is alive in this scope, so the send cannot fail.
        let _ = tx.send(Ok(initial));
        inner.watchers.insert(
            id,
            Watcher {
                path: path.clone(),
                tx,
            },
        );
        tracing::debug!(target: "palaver_memory_storage", "Watch {:?} registered on {}", id, path);

        Ok(Watch {
            id,
            path: path.clone(),
            events: rx,
        })
    }

    fn unwatch(&self, id: WatchId) {
        if self.inner.write().watchers.remove(&id).is_some() {
            tracing::debug!(target: "palaver_memory_storage", "Watch {:?} released", id);
        }
    }
}
