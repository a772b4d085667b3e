//! Conversation list
//!
//! One entry per other known user, with the newest message exchanged and how many of
//! the peer's messages the local user has not seen yet.

use std::cmp::Ordering;

use palaver_storage_traits::{
    BlobStore, ConversationId, DocumentStore, MessageRecord, ProfileRecord, RecordKey,
    Snapshot, StorePath, UserId,
};

use crate::conversation::resolve_between;
use crate::projection::decode_records;
use crate::{Palaver, Result};

/// A one-to-one conversation as listed in the inbox
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSummary {
    /// The conversation
    pub conversation: ConversationId,
    /// The other participant
    pub peer: UserId,
    /// The other participant's profile
    pub profile: ProfileRecord,
    /// Newest message by `createdAt`
    pub last_message: Option<MessageRecord>,
    /// Unseen messages authored by the peer
    pub unread: usize,
}

/// Builds the summary of one conversation from its records.
pub fn summarize(
    conversation: ConversationId,
    peer: UserId,
    profile: ProfileRecord,
    records: Vec<(RecordKey, MessageRecord)>,
) -> ConversationSummary {
    let unread = records
        .iter()
        .filter(|(_, record)| record.user_id == peer && !record.seen)
        .count();
    let last_message = records
        .into_iter()
        .max_by(|(ka, a), (kb, b)| a.created_at.cmp(&b.created_at).then_with(|| ka.cmp(kb)))
        .map(|(_, record)| record);

    ConversationSummary {
        conversation,
        peer,
        profile,
        last_message,
        unread,
    }
}

/// Newest conversation first, conversations without messages last
fn newest_first(a: &ConversationSummary, b: &ConversationSummary) -> Ordering {
    let time = |s: &ConversationSummary| s.last_message.as_ref().map(|m| m.created_at);
    match (time(a), time(b)) {
        (Some(ta), Some(tb)) => tb.cmp(&ta),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.peer.cmp(&b.peer))
}

impl<Store, Blobs> Palaver<Store, Blobs>
where
    Store: DocumentStore + 'static,
    Blobs: BlobStore,
{
    /// Lists the conversations `local_user` can open, newest activity first.
    ///
    /// Profiles that do not parse, or whose key cannot form a conversation id, are
    /// skipped with a warning.
    pub fn inbox(&self, local_user: &UserId) -> Result<Vec<ConversationSummary>> {
        let profiles = Snapshot {
            path: StorePath::profiles(),
            value: self.store.get(&StorePath::profiles())?,
        };

        let mut summaries = Vec::new();
        for (key, profile) in decode_records::<ProfileRecord>(&profiles) {
            if key.as_str() == local_user.as_str() {
                continue;
            }
            let Ok(peer) = UserId::new(key.as_str()) else {
                continue;
            };
            let conversation = match resolve_between(local_user, &peer) {
                Ok(conversation) => conversation,
                Err(e) => {
                    tracing::warn!(
                        target: "palaver_core::inbox",
                        "Skipping peer {}: {}",
                        peer,
                        e
                    );
                    continue;
                }
            };

            let messages = Snapshot {
                path: conversation.messages_path(),
                value: self.store.get(&conversation.messages_path())?,
            };
            summaries.push(summarize(
                conversation,
                peer,
                profile,
                decode_records(&messages),
            ));
        }

        summaries.sort_by(newest_first);
        tracing::debug!(
            target: "palaver_core::inbox",
            "Inbox of {} has {} conversations",
            local_user,
            summaries.len()
        );
        Ok(summaries)
    }
}
