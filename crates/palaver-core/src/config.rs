//! Client configuration

use std::path::Path;

use serde::Deserialize;

/// Display name used when the sender has no profile
pub const DEFAULT_USER_NAME: &str = "User";

/// Avatar used when the sender has no profile image
pub const DEFAULT_AVATAR_URL: &str = "https://placeimg.com/140/140/any";

/// Prefix of the map link stored with shared locations
pub const DEFAULT_MAP_LINK_BASE: &str = "https://maps.google.com/?q=";

/// Configuration for Palaver behavior
///
/// Every field has a default, so a partial JSON file only overrides what it names.
///
/// # Examples
///
/// ```rust
/// use palaver_core::PalaverConfig;
///
/// let config = PalaverConfig {
///     coalesce_snapshots: false,
///     ..Default::default()
/// };
/// assert_eq!(config.default_user_name, "User");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PalaverConfig {
    /// Name recorded on outgoing messages when the sender has no profile.
    ///
    /// Default: `"User"`
    pub default_user_name: String,
    /// Avatar recorded on outgoing messages when the sender has no profile image.
    pub default_avatar_url: String,
    /// Prefix of shared-location map links; `"{lat},{lon}"` is appended.
    pub map_link_base: String,
    /// Collapse snapshots that queued up while a delivery was running, delivering only
    /// the newest one.
    ///
    /// Default: true
    pub coalesce_snapshots: bool,
    /// Largest attachment accepted for upload, in bytes.
    ///
    /// Default: 20 MiB
    pub max_attachment_bytes: u64,
}

impl Default for PalaverConfig {
    fn default() -> Self {
        Self {
            default_user_name: DEFAULT_USER_NAME.to_string(),
            default_avatar_url: DEFAULT_AVATAR_URL.to_string(),
            map_link_base: DEFAULT_MAP_LINK_BASE.to_string(),
            coalesce_snapshots: true,
            max_attachment_bytes: 20 * 1024 * 1024,
        }
    }
}

impl PalaverConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a JSON configuration file.
    ///
    /// A missing file yields the defaults; a file that does not parse is logged and
    /// also yields the defaults.
    pub fn load<P>(path: P) -> Self
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let Ok(bytes) = std::fs::read(path) else {
            return Self::default();
        };
        match serde_json::from_slice::<Self>(&bytes) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    target: "palaver_core::config",
                    "Ignoring unreadable config {}: {}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }
}
