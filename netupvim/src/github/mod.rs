//! Read-only access to hosted releases.
//!
//! Only the latest release of a repository is ever consulted. The
//! [`ReleasesApi`] trait is the seam hosted-release sources depend on;
//! [`GithubClient`] is the production implementation.

mod client;
mod types;

pub use client::{GithubClient, GithubCredentials, DEFAULT_API_BASE};
pub use types::{Asset, Release, ASSET_STATE_UPLOADED};

use crate::error::UpdateResult;

/// Lookup of the latest release of `owner/project`.
pub trait ReleasesApi: Send + Sync {
    /// Fetch the latest release.
    fn latest_release(&self, owner: &str, project: &str) -> UpdateResult<Release>;
}
