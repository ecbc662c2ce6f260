//! Where the next archive comes from.
//!
//! A [`Source`] is one of exactly two fetch strategies:
//!
//! ```text
//! Source
//!   ├── Direct  (fixed URL)          ──► Downloader
//!   └── GitHub  (latest release API) ──► ReleasesApi ──► Downloader
//! ```
//!
//! Sources hold no mutable state; each `fetch` is independent. Network
//! access goes through the collaborators carried by [`FetchContext`], which
//! keeps the strategies testable with in-memory fakes.

mod direct;
mod github;
mod registry;

pub use direct::DirectSource;
pub use github::GithubSource;
pub use registry::{Channel, Package, SourceRegistry};

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::download::{Downloader, ProgressFn};
use crate::error::UpdateResult;
use crate::github::ReleasesApi;

/// Collaborators a source needs to fetch an archive.
#[derive(Clone, Copy)]
pub struct FetchContext<'a> {
    pub downloader: &'a dyn Downloader,
    pub releases: &'a dyn ReleasesApi,
}

impl<'a> FetchContext<'a> {
    pub fn new(downloader: &'a dyn Downloader, releases: &'a dyn ReleasesApi) -> Self {
        Self {
            downloader,
            releases,
        }
    }
}

/// An upstream location for one package on one architecture.
#[derive(Debug, Clone)]
pub enum Source {
    /// Fixed download URL.
    Direct(DirectSource),
    /// Asset of the latest hosted release.
    GitHub(GithubSource),
}

impl Source {
    /// Fetch the archive into `out_dir` and return its path.
    ///
    /// Fails with [`UpdateError::NotModified`](crate::UpdateError::NotModified)
    /// when nothing changed since `pivot`.
    pub fn fetch(
        &self,
        ctx: &FetchContext<'_>,
        out_dir: &Path,
        pivot: Option<DateTime<Utc>>,
        progress: Option<&ProgressFn<'_>>,
    ) -> UpdateResult<PathBuf> {
        match self {
            Self::Direct(source) => source.fetch(ctx.downloader, out_dir, pivot, progress),
            Self::GitHub(source) => source.fetch(ctx, out_dir, pivot, progress),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(source) => write!(f, "{}", source.url()),
            Self::GitHub(source) => write!(
                f,
                "github:{}/{} ({})",
                source.owner(),
                source.project(),
                source.pattern()
            ),
        }
    }
}
