//! User profiles
//!
//! Profiles live under `profiles/{user}`. Dispatch reads them to stamp the sender's
//! name and avatar onto outgoing messages; a missing profile is not an error there.

use palaver_storage_traits::blob::PROFILE_IMAGES_PREFIX;
use palaver_storage_traits::{
    BlobPath, BlobStore, DocumentStore, ProfileRecord, StorePath, UserId,
};
use serde_json::{Map, Value};

use crate::dispatch::SenderIdentity;
use crate::error::Error;
use crate::{Palaver, Result};

/// MIME type profile images are stored with
pub const PROFILE_IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Profile fields a user edits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDraft {
    /// Full name
    pub nom: String,
    /// Display name
    pub pseudo: String,
    /// Phone number
    pub telephone: String,
    /// New avatar, JPEG encoded
    pub avatar: Option<Vec<u8>>,
}

impl ProfileDraft {
    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("nom", &self.nom),
            ("pseudo", &self.pseudo),
            ("telephone", &self.telephone),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidInput(format!("profile {field} is empty")));
            }
        }
        Ok(())
    }
}

impl<Store, Blobs> Palaver<Store, Blobs>
where
    Store: DocumentStore + 'static,
    Blobs: BlobStore,
{
    /// Reads a user's profile
    pub fn fetch_profile(&self, user: &UserId) -> Result<Option<ProfileRecord>> {
        let Some(value) = self.store.get(&StorePath::profile(user))? else {
            return Ok(None);
        };
        let profile = serde_json::from_value(value)
            .map_err(|e| Error::Storage(e.into()))?;
        Ok(Some(profile))
    }

    /// Saves the profile of `user`, uploading a new avatar first when given.
    ///
    /// Saving also marks the user as connected. Returns the profile as stored.
    pub fn save_profile(&self, user: &UserId, draft: ProfileDraft) -> Result<ProfileRecord> {
        draft.validate()?;

        let profile_image = match draft.avatar {
            Some(bytes) => {
                let path = BlobPath::new(PROFILE_IMAGES_PREFIX, &format!("{user}.jpg"))?;
                let url = self
                    .blobs
                    .upload(&path, bytes, PROFILE_IMAGE_MIME_TYPE)
                    .map_err(Error::from_upload)?;
                Some(url)
            }
            None => self
                .fetch_profile(user)?
                .and_then(|existing| existing.profile_image),
        };

        let profile = ProfileRecord {
            uid: Some(user.clone()),
            nom: Some(draft.nom),
            pseudo: Some(draft.pseudo),
            telephone: Some(draft.telephone),
            profile_image,
            is_connected: true,
        };
        let fields = match serde_json::to_value(&profile).map_err(|e| Error::Storage(e.into()))? {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        self.store.update(&StorePath::profile(user), fields)?;

        tracing::info!(target: "palaver_core::profiles", "Saved profile of {}", user);
        Ok(profile)
    }

    /// Records whether `user` is online
    pub fn set_presence(&self, user: &UserId, connected: bool) -> Result<()> {
        let mut fields = Map::new();
        fields.insert("isConnected".to_string(), Value::Bool(connected));
        self.store.update(&StorePath::profile(user), fields)?;
        tracing::debug!(
            target: "palaver_core::profiles",
            "Presence of {} set to {}",
            user,
            connected
        );
        Ok(())
    }

    /// Identity to stamp on messages sent by `user`.
    ///
    /// Falls back to the configured default name and avatar, logging why, when the
    /// profile is missing, incomplete or unreadable.
    pub fn resolve_sender(&self, user: &UserId) -> SenderIdentity {
        let profile = match self.fetch_profile(user) {
            Ok(Some(profile)) => Some(profile),
            Ok(None) => {
                tracing::warn!(
                    target: "palaver_core::profiles",
                    "No profile for {}, using defaults",
                    user
                );
                None
            }
            Err(e) => {
                tracing::warn!(
                    target: "palaver_core::profiles",
                    "Failed to read profile of {}, using defaults: {}",
                    user,
                    e
                );
                None
            }
        };

        let (pseudo, image) = profile
            .map(|p| (p.pseudo, p.profile_image))
            .unwrap_or_default();
        SenderIdentity {
            user_id: user.clone(),
            user_name: pseudo
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| self.config.default_user_name.clone()),
            avatar: Some(image.unwrap_or_else(|| self.config.default_avatar_url.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use palaver_storage_traits::StoreError;
    use palaver_storage_traits::test_utils::user;
    use serde_json::json;

    use super::*;
    use crate::config::{DEFAULT_AVATAR_URL, DEFAULT_USER_NAME};
    use crate::test_util::palaver;

    fn draft() -> ProfileDraft {
        ProfileDraft {
            nom: "Ana Lima".to_string(),
            pseudo: "ana".to_string(),
            telephone: "+33 6 00 00 00 00".to_string(),
            avatar: None,
        }
    }

    #[test]
    fn test_save_and_fetch_profile() {
        let (palaver, _, _) = palaver();
        let saved = palaver.save_profile(&user("u1"), draft()).unwrap();
        assert!(saved.is_connected);

        let fetched = palaver.fetch_profile(&user("u1")).unwrap().unwrap();
        assert_eq!(fetched, saved);
        assert_eq!(fetched.uid, Some(user("u1")));
        assert_eq!(palaver.fetch_profile(&user("u2")).unwrap(), None);
    }

    #[test]
    fn test_save_requires_every_field() {
        let (palaver, store, _) = palaver();
        let mut incomplete = draft();
        incomplete.telephone = " ".to_string();
        assert!(matches!(
            palaver.save_profile(&user("u1"), incomplete),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(store.get(&StorePath::profile(&user("u1"))).unwrap(), None);
    }

    #[test]
    fn test_avatar_uploaded_as_jpeg() {
        let (palaver, _, blobs) = palaver();
        let mut with_avatar = draft();
        with_avatar.avatar = Some(vec![0xff, 0xd8]);

        let saved = palaver.save_profile(&user("u1"), with_avatar).unwrap();
        assert_eq!(
            saved.profile_image.as_deref(),
            Some("https://files.test/profiles/u1.jpg")
        );
        let blob = blobs.object("profiles/u1.jpg").unwrap();
        assert_eq!(blob.content_type, PROFILE_IMAGE_MIME_TYPE);

        // saving again without a new avatar keeps the old one
        let resaved = palaver.save_profile(&user("u1"), draft()).unwrap();
        assert_eq!(resaved.profile_image, saved.profile_image);
    }

    #[test]
    fn test_failed_avatar_upload_leaves_profile_untouched() {
        let (palaver, store, blobs) = palaver();
        blobs.fail_uploads(StoreError::Unavailable("offline".to_string()));
        let mut with_avatar = draft();
        with_avatar.avatar = Some(vec![1]);

        assert!(matches!(
            palaver.save_profile(&user("u1"), with_avatar),
            Err(Error::UploadFailure(_))
        ));
        assert_eq!(store.get(&StorePath::profile(&user("u1"))).unwrap(), None);
    }

    #[test]
    fn test_set_presence_merges() {
        let (palaver, store, _) = palaver();
        palaver.save_profile(&user("u1"), draft()).unwrap();
        palaver.set_presence(&user("u1"), false).unwrap();

        let stored = store.get(&StorePath::profile(&user("u1"))).unwrap().unwrap();
        assert_eq!(stored["isConnected"], json!(false));
        assert_eq!(stored["pseudo"], json!("ana"));
    }

    #[test]
    fn test_resolve_sender_from_profile() {
        let (palaver, store, _) = palaver();
        store
            .set(
                &StorePath::profile(&user("u1")),
                json!({"pseudo": "ana", "profileImage": "https://img.test/ana.jpg"}),
            )
            .unwrap();

        let identity = palaver.resolve_sender(&user("u1"));
        assert_eq!(identity.user_name, "ana");
        assert_eq!(identity.avatar.as_deref(), Some("https://img.test/ana.jpg"));
    }

    #[test]
    fn test_resolve_sender_defaults() {
        let (palaver, store, _) = palaver();
        let identity = palaver.resolve_sender(&user("ghost"));
        assert_eq!(identity.user_name, DEFAULT_USER_NAME);
        assert_eq!(identity.avatar.as_deref(), Some(DEFAULT_AVATAR_URL));

        store.deny_reads(StorePath::profiles());
        let identity = palaver.resolve_sender(&user("ghost"));
        assert_eq!(identity.user_name, DEFAULT_USER_NAME);
    }
}
