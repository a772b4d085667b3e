//! Document store module
//!
//! The realtime document store is a JSON tree with change notification. This module
//! defines the trait adapters implement and the types a watch delivers.

use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::ids::RecordKey;
use crate::path::StorePath;

/// Identifier of an active watch, used to release it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WatchId(pub u64);

/// The full value at a watched path at one point in time
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// The watched path
    pub path: StorePath,
    /// The value at `path`, or `None` when nothing is stored there
    pub value: Option<Value>,
}

impl Snapshot {
    /// Whether anything is stored at the path
    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    /// Children of the snapshot when it is an object node.
    ///
    /// Iteration order of the returned map carries no meaning.
    pub fn children(&self) -> Option<&Map<String, Value>> {
        self.value.as_ref().and_then(Value::as_object)
    }
}

/// One delivery on a watch: a fresh snapshot, or a terminal error after which the
/// channel closes.
pub type WatchEvent = Result<Snapshot, StoreError>;

/// A standing watch on a store path.
///
/// The first event is the current value at the time the watch was established. After
/// that, every write that can change the value at the path produces one event, in the
/// order the store applied the writes. Release the watch with
/// [`DocumentStore::unwatch`]; dropping the receiver alone only stops deliveries
/// lazily.
#[derive(Debug)]
pub struct Watch {
    /// Identifier to release the watch with
    pub id: WatchId,
    /// Watched path
    pub path: StorePath,
    /// Event stream
    pub events: flume::Receiver<WatchEvent>,
}

/// Storage trait for the realtime document store.
///
/// Writes are last-write-wins. Implementations must deliver watch events for a given
/// path in the order the writes were applied.
pub trait DocumentStore: Send + Sync {
    /// Read the value at `path`, `None` if nothing is stored there.
    fn get(&self, path: &StorePath) -> Result<Option<Value>, StoreError>;

    /// Replace the value at `path`. Writing `Value::Null` deletes it.
    fn set(&self, path: &StorePath, value: Value) -> Result<(), StoreError>;

    /// Merge `fields` into the object at `path`, leaving other children untouched.
    ///
    /// A `null` field deletes that child.
    fn update(&self, path: &StorePath, fields: Map<String, Value>) -> Result<(), StoreError>;

    /// Append `value` under a new store-generated key beneath `path`.
    ///
    /// Keys are unique and sort in roughly chronological order of the append.
    fn push(&self, path: &StorePath, value: Value) -> Result<RecordKey, StoreError>;

    /// Start watching `path`.
    ///
    /// Fails immediately if the caller may not read `path`.
    fn watch(&self, path: &StorePath) -> Result<Watch, StoreError>;

    /// Release a watch. Unknown ids are ignored.
    fn unwatch(&self, id: WatchId);
}
