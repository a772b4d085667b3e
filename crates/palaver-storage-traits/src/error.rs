//! Error types for Palaver store operations

use thiserror::Error;

/// Error type for document store and blob store operations.
///
/// Adapters translate whatever their backend reports into one of these variants so
/// the core can tell authorization failures and transient outages apart from
/// everything else.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend rejected the operation for the current identity
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The backend could not be reached or timed out
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// A path or key was malformed
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Requested item was not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("error: {0}")]
    Other(String),
}

impl StoreError {
    /// Whether retrying the same operation later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            Self::Deserialization(err.to_string())
        } else {
            Self::Serialization(err.to_string())
        }
    }
}
