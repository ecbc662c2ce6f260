use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{debug, info};

use super::FetchContext;
use crate::download::ProgressFn;
use crate::error::{UpdateError, UpdateResult};
use crate::github::{Asset, ReleasesApi};

/// Source resolved through the latest release of a hosted repository.
///
/// The asset is the first one, in listed order, whose name matches
/// `pattern`. The release timestamp is compared with the pivot before any
/// transfer; the downloader then repeats the check against the server.
#[derive(Debug, Clone)]
pub struct GithubSource {
    owner: String,
    project: String,
    pattern: Regex,
}

impl GithubSource {
    /// Create a source; `pattern` is a regular expression over asset names.
    pub fn new(
        owner: impl Into<String>,
        project: impl Into<String>,
        pattern: &str,
    ) -> UpdateResult<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| UpdateError::InvalidConfig(format!("asset pattern {pattern:?}: {e}")))?;
        Ok(Self {
            owner: owner.into(),
            project: project.into(),
            pattern,
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Pick the asset to install from the latest release.
    pub fn select_asset(&self, api: &dyn ReleasesApi) -> UpdateResult<Asset> {
        let release = api.latest_release(&self.owner, &self.project)?;
        if release.draft || release.prerelease {
            return Err(UpdateError::NoEligibleRelease {
                owner: self.owner.clone(),
                project: self.project.clone(),
            });
        }

        let asset = release
            .assets
            .into_iter()
            .find(|a| self.pattern.is_match(&a.name))
            .ok_or_else(|| UpdateError::NoMatchingAsset {
                pattern: self.pattern.as_str().to_string(),
            })?;

        if !asset.is_uploaded() {
            return Err(UpdateError::IncompleteAsset {
                name: asset.name,
                state: asset.state,
            });
        }

        debug!(tag = %release.tag_name, asset = %asset.name, "release asset selected");
        Ok(asset)
    }

    pub fn fetch(
        &self,
        ctx: &FetchContext<'_>,
        out_dir: &Path,
        pivot: Option<DateTime<Utc>>,
        progress: Option<&ProgressFn<'_>>,
    ) -> UpdateResult<PathBuf> {
        let asset = self.select_asset(ctx.releases)?;

        if let Some(pivot) = pivot {
            if pivot > asset.updated_at {
                info!(asset = %asset.name, updated_at = %asset.updated_at, "asset not modified since last update");
                return Err(UpdateError::NotModified);
            }
        }

        ctx.downloader
            .download(&asset.download_url, out_dir, pivot, progress)
    }
}
