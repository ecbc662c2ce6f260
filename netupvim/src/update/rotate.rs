//! Numbered backups of executables an install is about to replace.
//!
//! Windows refuses to overwrite a running executable but allows renaming
//! it, so the updater can replace itself once the old image is moved aside.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Backups kept per executable unless configured otherwise.
pub const DEFAULT_EXE_ROTATE_COUNT: usize = 5;

/// Path of the `n`th backup of `exe`; `1` is the most recent.
pub fn backup_path(exe: &Path, n: usize) -> PathBuf {
    let mut name = OsString::from(exe.as_os_str());
    name.push(format!(".old.{n}"));
    PathBuf::from(name)
}

/// Move `exe` to its first backup slot.
///
/// Existing backups shift up by one; the one that would exceed `keep` is
/// removed. A `keep` of zero is treated as one.
pub fn rotate_executable(exe: &Path, keep: usize) -> io::Result<PathBuf> {
    let keep = keep.max(1);

    let oldest = backup_path(exe, keep);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for n in (1..keep).rev() {
        let from = backup_path(exe, n);
        if from.exists() {
            fs::rename(&from, backup_path(exe, n + 1))?;
        }
    }

    let newest = backup_path(exe, 1);
    fs::rename(exe, &newest)?;
    debug!(exe = %exe.display(), backup = %newest.display(), "executable moved aside");
    Ok(newest)
}

/// Whether an archive entry is a Windows executable.
pub(crate) fn is_executable(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("exe"))
        .unwrap_or(false)
}
