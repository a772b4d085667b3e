//! Message dispatch
//!
//! Turns a composed message into one appended record. Attachments are uploaded first
//! and the record is only appended once the upload succeeded, so no record ever points
//! at a missing blob.
//!
//! Every send captures `createdAt` from the local clock at call time. Display ordering
//! uses that field, so a skewed sender clock misplaces its messages; this is accepted.
//! Sends are not idempotent: two identical calls append two records.

use std::path::PathBuf;

use palaver_storage_traits::blob::{CHAT_FILES_PREFIX, GROUP_FILES_PREFIX};
use palaver_storage_traits::{
    BlobPath, BlobStore, ConversationId, ConversationKind, DocumentStore, GroupContent,
    GroupMessageRecord, Location, MessageRecord, RecordKey, SenderSnapshot, Timestamp, UserId,
};
use serde::Serialize;

use crate::config::PalaverConfig;
use crate::error::Error;
use crate::{Palaver, Result};

/// Text stored with a location shared in the group conversation
pub const GROUP_LOCATION_TEXT: &str = "Shared location";

/// Identity recorded on outgoing messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderIdentity {
    /// Author
    pub user_id: UserId,
    /// Display name
    pub user_name: String,
    /// Avatar URL
    pub avatar: Option<String>,
}

/// A local file to attach
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Where the content is read from
    pub path: PathBuf,
    /// Name shown to readers; only its last path component is kept
    pub name: String,
    /// MIME type sent with the upload
    pub mime_type: String,
}

impl LocalFile {
    /// Attach the file at `path`, shown under `name`
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// A validated geographic position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Validates latitude in `[-90, 90]` and longitude in `[-180, 180]`
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidInput(format!("latitude {latitude} out of range")));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidInput(format!(
                "longitude {longitude} out of range"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Stored location with its map link
    pub fn to_location(&self, config: &PalaverConfig) -> Location {
        Location {
            latitude: self.latitude,
            longitude: self.longitude,
            link: format!("{}{},{}", config.map_link_base, self.latitude, self.longitude),
        }
    }
}

/// A group message composed of any mix of text, file and location
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupDraft {
    /// Text body
    pub text: Option<String>,
    /// File to upload and attach
    pub file: Option<LocalFile>,
    /// Position to share
    pub location: Option<Coordinates>,
}

impl GroupDraft {
    fn is_empty(&self) -> bool {
        self.text.as_deref().is_none_or(|t| t.trim().is_empty())
            && self.file.is_none()
            && self.location.is_none()
    }
}

/// Payload of one outgoing message before it is shaped into a record
#[derive(Debug, Default)]
struct Outgoing {
    text: Option<String>,
    file_url: Option<String>,
    file_name: Option<String>,
    location: Option<Location>,
}

/// Keeps the last path component of a user-supplied file name
fn sanitize_file_name(name: &str) -> Result<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if base.is_empty() || base == "." || base == ".." {
        return Err(Error::InvalidInput(format!("file name {name:?} is empty")));
    }
    Ok(base.to_string())
}

impl<Store, Blobs> Palaver<Store, Blobs>
where
    Store: DocumentStore + 'static,
    Blobs: BlobStore,
{
    /// Appends a text message. Returns the key of the new record.
    pub fn send_text(
        &self,
        conversation: &ConversationId,
        sender: &SenderIdentity,
        text: &str,
    ) -> Result<RecordKey> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("message text is empty".to_string()));
        }
        self.append(
            conversation,
            sender,
            Outgoing {
                text: Some(text.to_string()),
                ..Default::default()
            },
        )
    }

    /// Uploads `file`, then appends a message pointing at it.
    ///
    /// Nothing is appended when reading or uploading the file fails.
    pub fn send_attachment(
        &self,
        conversation: &ConversationId,
        sender: &SenderIdentity,
        file: &LocalFile,
    ) -> Result<RecordKey> {
        let (file_url, file_name) = self.upload_attachment(conversation.kind(), file)?;
        self.append(
            conversation,
            sender,
            Outgoing {
                file_url: Some(file_url),
                file_name: Some(file_name),
                ..Default::default()
            },
        )
    }

    /// Appends a shared location.
    pub fn send_location(
        &self,
        conversation: &ConversationId,
        sender: &SenderIdentity,
        coordinates: Coordinates,
    ) -> Result<RecordKey> {
        let text = conversation
            .is_group()
            .then(|| GROUP_LOCATION_TEXT.to_string());
        self.append(
            conversation,
            sender,
            Outgoing {
                text,
                location: Some(coordinates.to_location(&self.config)),
                ..Default::default()
            },
        )
    }

    /// Appends one group message carrying everything in `draft`.
    ///
    /// The file, if any, is uploaded before the record is appended.
    pub fn send_group_message(
        &self,
        sender: &SenderIdentity,
        draft: GroupDraft,
    ) -> Result<RecordKey> {
        if draft.is_empty() {
            return Err(Error::InvalidInput("group message is empty".to_string()));
        }

        let mut outgoing = Outgoing {
            text: draft.text.filter(|t| !t.trim().is_empty()),
            location: draft
                .location
                .map(|coordinates| coordinates.to_location(&self.config)),
            ..Default::default()
        };
        if let Some(file) = &draft.file {
            let (file_url, file_name) = self.upload_attachment(ConversationKind::Group, file)?;
            outgoing.file_url = Some(file_url);
            outgoing.file_name = Some(file_name);
        }

        self.append(&ConversationId::group(), sender, outgoing)
    }

    /// Reads and uploads an attachment, returning its URL and display name
    fn upload_attachment(&self, kind: ConversationKind, file: &LocalFile) -> Result<(String, String)> {
        let name = sanitize_file_name(&file.name)?;

        let metadata = std::fs::metadata(&file.path)
            .map_err(|e| Error::Attachment(format!("{}: {e}", file.path.display())))?;
        if metadata.len() > self.config.max_attachment_bytes {
            return Err(Error::InvalidInput(format!(
                "{name} is {} bytes, the limit is {}",
                metadata.len(),
                self.config.max_attachment_bytes
            )));
        }
        let bytes = std::fs::read(&file.path)
            .map_err(|e| Error::Attachment(format!("{}: {e}", file.path.display())))?;

        let prefix = match kind {
            ConversationKind::Direct => CHAT_FILES_PREFIX,
            ConversationKind::Group => GROUP_FILES_PREFIX,
        };
        let blob_name = format!("{}_{name}", Timestamp::now().as_millis());
        let path = BlobPath::new(prefix, &blob_name)?;

        tracing::debug!(
            target: "palaver_core::dispatch",
            "Uploading {} ({} bytes)",
            path.as_str(),
            bytes.len()
        );
        let url = self
            .blobs
            .upload(&path, bytes, &file.mime_type)
            .map_err(|e| {
                tracing::warn!(
                    target: "palaver_core::dispatch",
                    "Upload of {} failed: {}",
                    path.as_str(),
                    e
                );
                Error::from_upload(e)
            })?;
        Ok((url, name))
    }

    fn append(
        &self,
        conversation: &ConversationId,
        sender: &SenderIdentity,
        outgoing: Outgoing,
    ) -> Result<RecordKey> {
        let created_at = Timestamp::now();
        let value = match conversation.kind() {
            ConversationKind::Direct => to_record_value(&MessageRecord {
                text: outgoing.text,
                file_url: outgoing.file_url,
                file_name: outgoing.file_name,
                location: outgoing.location,
                created_at,
                user_id: sender.user_id.clone(),
                user_name: sender.user_name.clone(),
                user_avatar: sender.avatar.clone(),
                seen: false,
            })?,
            ConversationKind::Group => to_record_value(&GroupMessageRecord {
                user_id: sender.user_id.clone(),
                sender: SenderSnapshot {
                    user_id: sender.user_id.clone(),
                    user_name: sender.user_name.clone(),
                    photo_url: sender.avatar.clone(),
                },
                content: GroupContent {
                    text: outgoing.text,
                    file_name: outgoing.file_name,
                    file_url: outgoing.file_url,
                    location: outgoing.location,
                },
                created_at,
            })?,
        };

        let key = self.store.push(&conversation.messages_path(), value)?;
        tracing::debug!(
            target: "palaver_core::dispatch",
            "Appended {} to {}",
            key,
            conversation.as_str()
        );
        Ok(key)
    }
}

fn to_record_value<T>(record: &T) -> Result<serde_json::Value>
where
    T: Serialize,
{
    serde_json::to_value(record)
        .map_err(|e| Error::Storage(palaver_storage_traits::StoreError::from(e)))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use palaver_storage_traits::{StoreError, StorePath};
    use serde_json::json;

    use super::*;
    use crate::conversation::{resolve_group_id, resolve_one_to_one_id};
    use crate::test_util::{palaver, sender};

    fn temp_file(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    fn record_count(store: &impl DocumentStore, conversation: &ConversationId) -> usize {
        store
            .get(&conversation.messages_path())
            .unwrap()
            .and_then(|v| v.as_object().map(|m| m.len()))
            .unwrap_or(0)
    }

    #[test]
    fn test_send_text_appends_unseen_record() {
        let (palaver, store, _) = palaver();
        let conversation = resolve_one_to_one_id("u1", "u2").unwrap();

        let key = palaver
            .send_text(&conversation, &sender("u1"), "hi")
            .unwrap();
        let stored = store
            .get(&conversation.messages_path().record(&key))
            .unwrap()
            .unwrap();
        let record: MessageRecord = serde_json::from_value(stored).unwrap();

        assert_eq!(record.text.as_deref(), Some("hi"));
        assert!(!record.seen);
        assert_eq!(record.user_name, "u1-name");
        assert_eq!(record.user_avatar.as_deref(), Some("https://img.test/u1.jpg"));
        assert!(record.file_url.is_none());
        assert!(record.location.is_none());
    }

    #[test]
    fn test_identical_sends_make_distinct_records() {
        let (palaver, store, _) = palaver();
        let conversation = resolve_one_to_one_id("u1", "u2").unwrap();
        let a = palaver.send_text(&conversation, &sender("u1"), "same").unwrap();
        let b = palaver.send_text(&conversation, &sender("u1"), "same").unwrap();
        assert_ne!(a, b);
        assert_eq!(record_count(store.as_ref(), &conversation), 2);
    }

    #[test]
    fn test_send_text_rejects_blank() {
        let (palaver, store, _) = palaver();
        let conversation = resolve_one_to_one_id("u1", "u2").unwrap();
        assert!(matches!(
            palaver.send_text(&conversation, &sender("u1"), "  \n"),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(record_count(store.as_ref(), &conversation), 0);
    }

    #[test]
    fn test_send_attachment_uploads_then_appends() {
        let (palaver, store, blobs) = palaver();
        let conversation = resolve_one_to_one_id("u1", "u2").unwrap();
        let file = temp_file(b"%PDF");

        let key = palaver
            .send_attachment(
                &conversation,
                &sender("u1"),
                &LocalFile::new(file.path(), "report.pdf", "application/pdf"),
            )
            .unwrap();

        let names = blobs.object_names();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("chat_files/"));
        assert!(names[0].ends_with("_report.pdf"));
        assert_eq!(blobs.object(&names[0]).unwrap().content_type, "application/pdf");

        let stored = store
            .get(&conversation.messages_path().record(&key))
            .unwrap()
            .unwrap();
        let record: MessageRecord = serde_json::from_value(stored).unwrap();
        assert_eq!(record.file_name.as_deref(), Some("report.pdf"));
        assert_eq!(
            record.file_url,
            Some(format!("https://files.test/{}", names[0]))
        );
        assert!(record.text.is_none());
    }

    #[test]
    fn test_failed_upload_appends_nothing() {
        let (palaver, store, blobs) = palaver();
        let conversation = resolve_one_to_one_id("u1", "u2").unwrap();
        let file = temp_file(b"data");
        blobs.fail_uploads(StoreError::Unavailable("offline".to_string()));

        let result = palaver.send_attachment(
            &conversation,
            &sender("u1"),
            &LocalFile::new(file.path(), "a.bin", "application/octet-stream"),
        );
        assert!(matches!(result, Err(Error::UploadFailure(_))));
        assert_eq!(record_count(store.as_ref(), &conversation), 0);
    }

    #[test]
    fn test_denied_upload_is_authorization_error() {
        let (palaver, store, blobs) = palaver();
        let conversation = resolve_one_to_one_id("u1", "u2").unwrap();
        let file = temp_file(b"data");
        blobs.fail_uploads(StoreError::PermissionDenied("bucket".to_string()));

        let result = palaver.send_attachment(
            &conversation,
            &sender("u1"),
            &LocalFile::new(file.path(), "a.bin", "application/octet-stream"),
        );
        assert!(matches!(result, Err(Error::AuthorizationDenied(_))));
        assert_eq!(record_count(store.as_ref(), &conversation), 0);
    }

    #[test]
    fn test_missing_file_is_attachment_error() {
        let (palaver, _, blobs) = palaver();
        let conversation = resolve_one_to_one_id("u1", "u2").unwrap();
        let dir = tempfile::tempdir().unwrap();

        let result = palaver.send_attachment(
            &conversation,
            &sender("u1"),
            &LocalFile::new(dir.path().join("gone.txt"), "gone.txt", "text/plain"),
        );
        assert!(matches!(result, Err(Error::Attachment(_))));
        assert!(blobs.is_empty());
    }

    #[test]
    fn test_oversized_attachment_rejected_before_upload() {
        let (_, store, blobs) = palaver();
        let palaver = Palaver::builder(store.clone(), blobs.clone())
            .with_config(PalaverConfig {
                max_attachment_bytes: 3,
                ..Default::default()
            })
            .build();
        let conversation = resolve_one_to_one_id("u1", "u2").unwrap();
        let file = temp_file(b"four");

        let result = palaver.send_attachment(
            &conversation,
            &sender("u1"),
            &LocalFile::new(file.path(), "big.bin", "application/octet-stream"),
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(blobs.is_empty());
    }

    #[test]
    fn test_file_name_is_reduced_to_last_component() {
        assert_eq!(sanitize_file_name("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_file_name(r"C:\docs\cv.pdf").unwrap(), "cv.pdf");
        assert!(sanitize_file_name("dir/").is_err());
        assert!(sanitize_file_name("..").is_err());
    }

    #[test]
    fn test_send_location() {
        let (palaver, store, _) = palaver();
        let conversation = resolve_one_to_one_id("u1", "u2").unwrap();
        let key = palaver
            .send_location(
                &conversation,
                &sender("u1"),
                Coordinates::new(48.8566, 2.3522).unwrap(),
            )
            .unwrap();

        let stored = store
            .get(&conversation.messages_path().record(&key))
            .unwrap()
            .unwrap();
        assert_eq!(
            stored["location"],
            json!({
                "latitude": 48.8566,
                "longitude": 2.3522,
                "link": "https://maps.google.com/?q=48.8566,2.3522",
            })
        );
        assert!(stored.get("text").is_none());
        assert!(stored.get("fileUrl").is_none());
    }

    #[test]
    fn test_coordinates_validation() {
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(90.5, 0.0).is_err());
        assert!(Coordinates::new(0.0, -180.5).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_group_message_duplicates_sender() {
        let (palaver, store, _) = palaver();
        let group = resolve_group_id();
        let key = palaver.send_text(&group, &sender("u1"), "hello all").unwrap();

        let stored = store.get(&group.messages_path().record(&key)).unwrap().unwrap();
        assert_eq!(
            stored["sender"],
            json!({"userId": "u1", "userName": "u1-name", "photoURL": "https://img.test/u1.jpg"})
        );
        assert_eq!(stored["content"]["text"], json!("hello all"));
        assert_eq!(stored["userId"], json!("u1"));
    }

    #[test]
    fn test_group_draft_with_file_and_location() {
        let (palaver, store, blobs) = palaver();
        let file = temp_file(b"jpeg");

        let key = palaver
            .send_group_message(
                &sender("u1"),
                GroupDraft {
                    text: Some("look".to_string()),
                    file: Some(LocalFile::new(file.path(), "pic.jpg", "image/jpeg")),
                    location: Some(Coordinates::new(1.0, 2.0).unwrap()),
                },
            )
            .unwrap();

        let names = blobs.object_names();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("GroupChatFiles/"));

        let path = StorePath::parse("GroupChat/globalGroupChat/messages")
            .unwrap()
            .record(&key);
        let record: GroupMessageRecord =
            serde_json::from_value(store.get(&path).unwrap().unwrap()).unwrap();
        assert_eq!(record.content.text.as_deref(), Some("look"));
        assert_eq!(record.content.file_name.as_deref(), Some("pic.jpg"));
        assert_eq!(record.content.location.unwrap().link, "https://maps.google.com/?q=1,2");
    }

    #[test]
    fn test_empty_group_draft_rejected() {
        let (palaver, _, _) = palaver();
        assert!(matches!(
            palaver.send_group_message(&sender("u1"), GroupDraft::default()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_group_location_carries_label() {
        let (palaver, store, _) = palaver();
        let group = resolve_group_id();
        let key = palaver
            .send_location(&group, &sender("u1"), Coordinates::new(0.5, 0.5).unwrap())
            .unwrap();
        let stored = store.get(&group.messages_path().record(&key)).unwrap().unwrap();
        assert_eq!(stored["content"]["text"], json!(GROUP_LOCATION_TEXT));
    }

    #[test]
    fn test_store_write_failure_is_surfaced() {
        let (palaver, store, _) = palaver();
        let conversation = resolve_one_to_one_id("u1", "u2").unwrap();
        store.fail_next_write(StoreError::Unavailable("offline".to_string()));
        let result = palaver.send_text(&conversation, &sender("u1"), "hi");
        assert!(matches!(result, Err(Error::TransientNetworkFailure(_))));
        assert!(result.unwrap_err().is_transient());
    }
}
