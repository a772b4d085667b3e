//! Palaver Public Prelude
//!
//! The types a chat client needs for everyday use. Store adapters are imported from
//! their own crates.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use palaver_core::prelude::*;
//! use palaver_memory_storage::{MemoryBlobStore, MemoryStore};
//!
//! let palaver = Palaver::new(Arc::new(MemoryStore::new()), Arc::new(MemoryBlobStore::new()));
//! let conversation = resolve_one_to_one_id("u1", "u2").unwrap();
//! assert_eq!(conversation.as_str(), "u1_u2");
//! # let _ = palaver;
//! ```

// === Core types ===
pub use crate::config::PalaverConfig;
pub use crate::{Error, Palaver, PalaverBuilder, Result};

// === Conversation identity ===
pub use crate::conversation::{resolve_group_id, resolve_one_to_one_id};
pub use palaver_storage_traits::{ConversationId, ConversationKind, RecordKey, UserId};

// === Sync ===
pub use crate::projection::{DisplayMessage, DisplaySender, MessageContent};
pub use crate::sync::{ConversationObserver, Subscription, SyncEvent};

// === Dispatch ===
pub use crate::dispatch::{Coordinates, GroupDraft, LocalFile, SenderIdentity};

// === Profiles and inbox ===
pub use crate::inbox::ConversationSummary;
pub use crate::profiles::ProfileDraft;

// === Storage traits (adapters implement these) ===
pub use palaver_storage_traits::{BlobStore, DocumentStore};
