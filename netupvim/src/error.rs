//! Error types for source resolution, downloads and updates.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for update operations.
pub type UpdateResult<T> = Result<T, UpdateError>;

/// Errors that can occur while resolving, fetching or installing a package.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// Requested or probed architecture has no mapping.
    #[error("unsupported architecture: {0}")]
    UnsupportedArchitecture(String),

    /// Update channel name is not one of release, develop or canary.
    #[error("unknown source: {0} (expected release, develop or canary)")]
    UnknownChannel(String),

    /// The (package, architecture) pair is not in the source table.
    #[error("source not found: {package} for {arch}")]
    SourceNotFound { package: String, arch: String },

    /// The latest release is a draft or a pre-release.
    #[error("absence of github release for {owner}/{project}")]
    NoEligibleRelease { owner: String, project: String },

    /// No asset of the latest release matches the name pattern.
    #[error("no matched assets in github release (pattern {pattern})")]
    NoMatchingAsset { pattern: String },

    /// The matched asset is still being uploaded.
    #[error("incomplete github asset {name}: state is {state:?}")]
    IncompleteAsset { name: String, state: String },

    /// The artifact has not changed since the pivot time.
    #[error("source not modified")]
    NotModified,

    /// The server answered with a status other than 200 or 304.
    #[error("unexpected response from {url}: {status}")]
    UnexpectedResponse { url: String, status: String },

    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    /// Transport-level failure.
    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The connection broke while the body was streaming.
    #[error("transfer from {url} failed")]
    TransferFailed {
        url: String,
        #[source]
        source: io::Error,
    },

    /// The transfer exceeded the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// URL could not be parsed or has no file name.
    #[error("invalid download URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Releases API returned a body that is not a release.
    #[error("failed to parse release from {url}")]
    ReleaseParseFailed {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Failed to write a file.
    #[error("failed to write {}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to create a directory.
    #[error("failed to create directory {}", path.display())]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Archive extraction failed.
    #[error("failed to extract {}: {reason}", path.display())]
    ExtractionFailed { path: PathBuf, reason: String },

    /// An executable about to be replaced could not be moved aside.
    #[error("failed to move aside {}", path.display())]
    RotateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl UpdateError {
    /// Whether this error means "nothing changed since the pivot".
    pub fn is_not_modified(&self) -> bool {
        matches!(self, Self::NotModified)
    }
}
