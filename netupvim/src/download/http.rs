//! HTTP-based conditional downloader.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::header::IF_MODIFIED_SINCE;
use reqwest::StatusCode;
use tracing::{debug, info};

use super::{copy_with_progress, download_filepath, http_date, CopyError, Downloader, ProgressFn};
use crate::error::{UpdateError, UpdateResult};
use crate::USER_AGENT;

/// Default timeout for a whole transfer in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300; // 5 minutes

/// HTTP-based downloader.
///
/// Issues a single GET per call, conditional on the pivot time when one is
/// given, and streams a 200 body to disk. A timeout covers the whole
/// transfer and surfaces as [`UpdateError::Timeout`].
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
    pub(crate) timeout: Duration,
}

impl HttpDownloader {
    /// Create a new HTTP downloader with default settings.
    pub fn new() -> UpdateResult<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a new HTTP downloader with custom timeout.
    pub fn with_timeout(timeout: Duration) -> UpdateResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(UpdateError::ClientBuild)?;

        Ok(Self { client, timeout })
    }

    fn request_error(&self, url: &str, e: reqwest::Error) -> UpdateError {
        if e.is_timeout() {
            UpdateError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            UpdateError::Http {
                url: url.to_string(),
                source: e,
            }
        }
    }

    /// Stream a successful response into `dest`.
    fn save_body(
        &self,
        url: &str,
        mut response: reqwest::blocking::Response,
        dest: &Path,
        progress: Option<&ProgressFn<'_>>,
    ) -> UpdateResult<u64> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| UpdateError::CreateDirFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let file = File::create(dest).map_err(|e| UpdateError::WriteFailed {
            path: dest.to_path_buf(),
            source: e,
        })?;

        let total = response.content_length();
        let mut writer = BufWriter::new(file);

        copy_with_progress(&mut response, &mut writer, total, progress).map_err(|e| match e {
            CopyError::Read(source) if is_timeout(&source) => UpdateError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            },
            CopyError::Read(source) => UpdateError::TransferFailed {
                url: url.to_string(),
                source,
            },
            CopyError::Write(source) => UpdateError::WriteFailed {
                path: dest.to_path_buf(),
                source,
            },
        })
    }
}

/// Whether a body read failed because the client timeout expired.
///
/// The blocking body reader wraps the client error in an `io::Error`.
fn is_timeout(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::TimedOut
        || e.get_ref()
            .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
            .is_some_and(reqwest::Error::is_timeout)
}

impl Downloader for HttpDownloader {
    fn download(
        &self,
        url: &str,
        out_dir: &Path,
        pivot: Option<DateTime<Utc>>,
        progress: Option<&ProgressFn<'_>>,
    ) -> UpdateResult<PathBuf> {
        let dest = download_filepath(url, out_dir)?;

        let mut request = self.client.get(url);
        if let Some(pivot) = pivot {
            request = request.header(IF_MODIFIED_SINCE, http_date(pivot));
        }

        debug!(url, conditional = pivot.is_some(), "requesting archive");
        let response = request.send().map_err(|e| self.request_error(url, e))?;

        match response.status() {
            StatusCode::OK => {
                let bytes = self.save_body(url, response, &dest, progress)?;
                info!(url, path = %dest.display(), bytes, "download complete");
                Ok(dest)
            }
            StatusCode::NOT_MODIFIED => {
                debug!(url, "server reports not modified");
                Err(UpdateError::NotModified)
            }
            status => Err(UpdateError::UnexpectedResponse {
                url: url.to_string(),
                status: status.to_string(),
            }),
        }
    }
}
