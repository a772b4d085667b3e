//! Palaver errors

use palaver_storage_traits::StoreError;

/// Palaver error
///
/// Every failure is scoped to the conversation or send action that triggered it;
/// nothing here is fatal to the process. The core never retries on its own, so callers
/// decide what to do with [`Error::TransientNetworkFailure`].
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// Malformed identifier or empty required field
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The store or blob service rejected the operation
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),
    /// Attachment upload failed; nothing was appended
    #[error("upload failed: {0}")]
    UploadFailure(String),
    /// The backend could not be reached
    #[error("transient network failure: {0}")]
    TransientNetworkFailure(String),
    /// Any other store failure
    #[error(transparent)]
    Storage(StoreError),
    /// The local attachment could not be read
    #[error("attachment error: {0}")]
    Attachment(String),
    /// No async runtime was available to drive a subscription
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::PermissionDenied(msg) => Self::AuthorizationDenied(msg),
            StoreError::Unavailable(msg) => Self::TransientNetworkFailure(msg),
            StoreError::InvalidPath(msg) => Self::InvalidInput(msg),
            other => Self::Storage(other),
        }
    }
}

impl Error {
    /// Maps a blob store failure.
    ///
    /// Authorization keeps its own variant; everything else is an upload failure.
    pub(crate) fn from_upload(e: StoreError) -> Self {
        match e {
            StoreError::PermissionDenied(msg) => Self::AuthorizationDenied(msg),
            other => Self::UploadFailure(other.to_string()),
        }
    }

    /// Whether retrying the same operation later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientNetworkFailure(_))
    }
}
