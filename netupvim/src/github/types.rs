//! Release and asset records as returned by the releases API.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Asset state once the binary is fully attached to the release.
pub const ASSET_STATE_UPLOADED: &str = "uploaded";

/// A published release.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// Tag of the release, for logging.
    #[serde(default)]
    pub tag_name: String,
    /// Draft releases are never installed.
    #[serde(default)]
    pub draft: bool,
    /// Pre-releases are never installed.
    #[serde(default)]
    pub prerelease: bool,
    /// Attached files in listed order.
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
    pub updated_at: DateTime<Utc>,
    pub state: String,
}

impl Asset {
    /// Whether the upload of this asset has finished.
    pub fn is_uploaded(&self) -> bool {
        self.state == ASSET_STATE_UPLOADED
    }
}
