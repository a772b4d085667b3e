//! Conversation identity
//!
//! A one-to-one conversation is keyed by both participants, sorted and joined with
//! [`DIRECT_ID_SEPARATOR`], so either side derives the same key without coordination.

use palaver_storage_traits::path::validate_segment;
use palaver_storage_traits::{ConversationId, UserId};

use crate::error::Error;

/// Separator between the two participants of a one-to-one conversation key
pub const DIRECT_ID_SEPARATOR: char = '_';

/// Derives the conversation key shared by `user_a` and `user_b`.
///
/// The result does not depend on argument order. Identifiers must be non-empty, valid
/// as a store path segment and free of [`DIRECT_ID_SEPARATOR`] so that two different
/// pairs can never produce the same key.
pub fn resolve_one_to_one_id(user_a: &str, user_b: &str) -> Result<ConversationId, Error> {
    check_participant(user_a)?;
    check_participant(user_b)?;

    let (first, second) = if user_a <= user_b {
        (user_a, user_b)
    } else {
        (user_b, user_a)
    };
    Ok(ConversationId::direct(format!(
        "{first}{DIRECT_ID_SEPARATOR}{second}"
    ))?)
}

/// Same as [`resolve_one_to_one_id`], for already-validated user ids.
pub fn resolve_between(user_a: &UserId, user_b: &UserId) -> Result<ConversationId, Error> {
    resolve_one_to_one_id(user_a.as_str(), user_b.as_str())
}

/// The global group conversation.
pub fn resolve_group_id() -> ConversationId {
    ConversationId::group()
}

fn check_participant(user: &str) -> Result<(), Error> {
    if user.is_empty() {
        return Err(Error::InvalidInput(
            "participant identifier is empty".to_string(),
        ));
    }
    if user.contains(DIRECT_ID_SEPARATOR) {
        return Err(Error::InvalidInput(format!(
            "participant identifier {user:?} contains '{DIRECT_ID_SEPARATOR}'"
        )));
    }
    validate_segment(user)
        .map_err(|_| Error::InvalidInput(format!("participant identifier {user:?} is malformed")))
}
