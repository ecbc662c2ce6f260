use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::download::{Downloader, ProgressFn};
use crate::error::UpdateResult;

/// Source with a fixed URL.
///
/// A bare URL carries no metadata to short-circuit on, so every fetch goes
/// to the downloader, which still sends the pivot as a precondition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectSource {
    url: String,
}

impl DirectSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn fetch(
        &self,
        downloader: &dyn Downloader,
        out_dir: &Path,
        pivot: Option<DateTime<Utc>>,
        progress: Option<&ProgressFn<'_>>,
    ) -> UpdateResult<PathBuf> {
        downloader.download(&self.url, out_dir, pivot, progress)
    }
}
