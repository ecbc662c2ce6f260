//! Last-update timestamps per package.
//!
//! Each package has an anchor file under `<work_dir>/var`. Its modification
//! time is the pivot for the next conditional fetch.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};

use crate::error::{UpdateError, UpdateResult};

/// Subdirectory of the work dir holding anchor files.
pub const ANCHOR_DIR: &str = "var";

#[derive(Debug, Clone)]
pub struct AnchorStore {
    dir: PathBuf,
}

impl AnchorStore {
    pub fn new(work_dir: &Path) -> Self {
        Self {
            dir: work_dir.join(ANCHOR_DIR),
        }
    }

    pub fn path(&self, package: &str) -> PathBuf {
        self.dir.join(format!("{package}.anchor"))
    }

    /// Time of the last successful install, if any.
    pub fn read(&self, package: &str) -> Option<DateTime<Utc>> {
        fs::metadata(self.path(package))
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from)
    }

    /// Record a successful install that started at `time`.
    pub fn record(&self, package: &str, time: DateTime<Utc>) -> UpdateResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| UpdateError::CreateDirFailed {
            path: self.dir.clone(),
            source: e,
        })?;

        let path = self.path(package);
        let write_err = |e| UpdateError::WriteFailed {
            path: path.clone(),
            source: e,
        };

        fs::write(&path, time.to_rfc3339()).map_err(write_err)?;
        File::options()
            .write(true)
            .open(&path)
            .and_then(|f| f.set_modified(SystemTime::from(time)))
            .map_err(write_err)
    }
}
