//! Palaver storage - the store abstraction Palaver conversations are synchronized through.
//!
//! Palaver never talks to a concrete realtime database SDK. Instead it is written against
//! two small traits defined here:
//!
//! - [`DocumentStore`]: a tree-structured, subscribe-on-change JSON document store
//!   (read, overwrite, merge, append under a generated key, watch a path)
//! - [`BlobStore`]: a write-once-per-name object store used for attachments and avatars
//!
//! The crate also owns the identifiers, store paths and persisted record layouts that
//! every adapter and the core agree on.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod blob;
pub mod document;
pub mod error;
pub mod ids;
pub mod path;
pub mod push_id;
pub mod records;
#[cfg(feature = "test-utils")]
pub mod test_utils;
pub mod timestamp;

pub use self::blob::{BlobPath, BlobStore};
pub use self::document::{DocumentStore, Snapshot, Watch, WatchEvent, WatchId};
pub use self::error::StoreError;
pub use self::ids::{ConversationId, ConversationKind, RecordKey, UserId};
pub use self::path::StorePath;
pub use self::push_id::PushIdGenerator;
pub use self::records::{
    GroupContent, GroupMessageRecord, Location, MessageRecord, ProfileRecord, SenderSnapshot,
};
pub use self::timestamp::Timestamp;
