//! Conditional downloads of package archives.
//!
//! This module provides:
//! - The [`Downloader`] seam used by sources (`HttpDownloader` in production)
//! - Destination naming derived from the URL path
//! - `If-Modified-Since` formatting for the pivot time
//! - The streaming core that reports progress after every write
//!
//! # Partial files
//!
//! The destination is truncated before streaming starts. If the transfer
//! fails halfway, the error is returned and the partial file is left on
//! disk. Callers must treat any path they did not receive through `Ok` as
//! incomplete.

mod http;

pub use http::{HttpDownloader, DEFAULT_TIMEOUT_SECS};

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{UpdateError, UpdateResult};

/// Buffer size for reading/writing during downloads (64KB).
pub(crate) const BUFFER_SIZE: usize = 64 * 1024;

/// Progress callback: `(bytes_so_far, total_bytes)`.
///
/// `total_bytes` is `None` when the server does not announce a length.
/// Invoked synchronously on the downloading thread.
pub type ProgressFn<'a> = dyn Fn(u64, Option<u64>) + Send + Sync + 'a;

/// Fetches a URL into a directory, honoring a pivot time.
pub trait Downloader: Send + Sync {
    /// Download `url` into `out_dir` and return the written path.
    ///
    /// When `pivot` is set the request is conditional; an unchanged resource
    /// yields [`UpdateError::NotModified`] and nothing is written.
    fn download(
        &self,
        url: &str,
        out_dir: &Path,
        pivot: Option<DateTime<Utc>>,
        progress: Option<&ProgressFn<'_>>,
    ) -> UpdateResult<PathBuf>;
}

/// Destination path for `url` inside `out_dir`: the last path segment.
pub fn download_filepath(url: &str, out_dir: &Path) -> UpdateResult<PathBuf> {
    let parsed = reqwest::Url::parse(url).map_err(|e| UpdateError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let name = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| UpdateError::InvalidUrl {
            url: url.to_string(),
            reason: "URL path has no file name".to_string(),
        })?;

    Ok(out_dir.join(name))
}

/// Format a pivot as an HTTP date (RFC 1123, always GMT).
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Which side of a copy failed.
#[derive(Debug)]
pub enum CopyError {
    /// Reading the source failed.
    Read(io::Error),
    /// Writing the destination failed.
    Write(io::Error),
}

/// Copy `reader` into `writer`, reporting cumulative bytes after each write.
///
/// Returns the number of bytes copied.
pub fn copy_with_progress<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    total: Option<u64>,
    progress: Option<&ProgressFn<'_>>,
) -> Result<u64, CopyError> {
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut written = 0u64;

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };

        writer.write_all(&buffer[..n]).map_err(CopyError::Write)?;
        written += n as u64;

        if let Some(cb) = progress {
            cb(written, total);
        }
    }

    writer.flush().map_err(CopyError::Write)?;
    Ok(written)
}
