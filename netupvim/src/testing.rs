//! In-memory collaborators for unit tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};

use crate::download::{download_filepath, Downloader, ProgressFn};
use crate::error::{UpdateError, UpdateResult};
use crate::github::{Asset, Release, ReleasesApi};
use crate::update::Installer;

/// Build an asset named `name` last updated at midnight UTC on the given day.
pub fn asset(name: &str, state: &str, year: i32, month: u32, day: u32) -> Asset {
    Asset {
        name: name.to_string(),
        download_url: format!("https://github.com/koron/vim-kaoriya/releases/download/v8.0.0/{name}"),
        updated_at: Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap(),
        state: state.to_string(),
    }
}

/// Build a published release with the given assets.
pub fn release(assets: Vec<Asset>) -> Release {
    Release {
        tag_name: "v8.0.0".to_string(),
        draft: false,
        prerelease: false,
        assets,
    }
}

/// Releases API that always answers with the same release.
pub struct MockReleases {
    release: Option<Release>,
    calls: Mutex<Vec<String>>,
}

impl MockReleases {
    pub fn with_release(release: Release) -> Self {
        Self {
            release: Some(release),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// API that answers 404 for every repository.
    pub fn empty() -> Self {
        Self {
            release: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ReleasesApi for MockReleases {
    fn latest_release(&self, owner: &str, project: &str) -> UpdateResult<Release> {
        self.calls.lock().unwrap().push(format!("{owner}/{project}"));
        self.release
            .clone()
            .ok_or_else(|| UpdateError::UnexpectedResponse {
                url: format!("mock://repos/{owner}/{project}/releases/latest"),
                status: "404 Not Found".to_string(),
            })
    }
}

enum MockOutcome {
    Body(Vec<u8>),
    NotModified,
    Status(String),
}

/// Downloader that writes a canned body, or fails, without any network.
pub struct MockDownloader {
    outcome: MockOutcome,
    calls: Mutex<Vec<(String, Option<DateTime<Utc>>)>>,
}

impl MockDownloader {
    pub fn with_body(body: &[u8]) -> Self {
        Self::new(MockOutcome::Body(body.to_vec()))
    }

    pub fn not_modified() -> Self {
        Self::new(MockOutcome::NotModified)
    }

    pub fn with_status(status: &str) -> Self {
        Self::new(MockOutcome::Status(status.to_string()))
    }

    fn new(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, Option<DateTime<Utc>>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Downloader for MockDownloader {
    fn download(
        &self,
        url: &str,
        out_dir: &Path,
        pivot: Option<DateTime<Utc>>,
        progress: Option<&ProgressFn<'_>>,
    ) -> UpdateResult<PathBuf> {
        self.calls.lock().unwrap().push((url.to_string(), pivot));
        match &self.outcome {
            MockOutcome::Body(body) => {
                let dest = download_filepath(url, out_dir)?;
                fs::create_dir_all(out_dir).unwrap();
                fs::write(&dest, body).unwrap();
                if let Some(cb) = progress {
                    cb(body.len() as u64, Some(body.len() as u64));
                }
                Ok(dest)
            }
            MockOutcome::NotModified => Err(UpdateError::NotModified),
            MockOutcome::Status(status) => Err(UpdateError::UnexpectedResponse {
                url: url.to_string(),
                status: status.clone(),
            }),
        }
    }
}

/// Installer that records what it was asked to install.
#[derive(Default)]
pub struct MockInstaller {
    calls: Mutex<Vec<(PathBuf, PathBuf, usize)>>,
}

impl MockInstaller {
    pub fn calls(&self) -> Vec<(PathBuf, PathBuf, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Installer for MockInstaller {
    fn install(&self, archive: &Path, target_dir: &Path, strip_components: usize) -> UpdateResult<()> {
        self.calls.lock().unwrap().push((
            archive.to_path_buf(),
            target_dir.to_path_buf(),
            strip_components,
        ));
        Ok(())
    }
}
