//! Archive installation into the target directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use super::rotate::{is_executable, rotate_executable, DEFAULT_EXE_ROTATE_COUNT};
use crate::error::{UpdateError, UpdateResult};

/// Places the contents of a downloaded archive into the target directory.
///
/// Only ever called with a path the downloader returned through `Ok`.
pub trait Installer: Send + Sync {
    /// Extract `archive` into `target_dir`, dropping `strip_components`
    /// leading path components of every entry.
    fn install(&self, archive: &Path, target_dir: &Path, strip_components: usize)
        -> UpdateResult<()>;
}

/// Shell-based archive extractor.
///
/// Uses the system `tar`. The bsdtar shipped with Windows 10 and later
/// reads zip archives as well as tarballs.
///
/// Executables the archive would overwrite are first renamed to numbered
/// backups (`vim.exe.old.1`, ...), so a running `netupvim.exe` or `gvim.exe`
/// does not block the install.
#[derive(Debug)]
pub struct ShellExtractor {
    exe_rotate_count: usize,
}

impl ShellExtractor {
    /// Create a new shell-based extractor.
    pub fn new() -> Self {
        Self {
            exe_rotate_count: DEFAULT_EXE_ROTATE_COUNT,
        }
    }

    /// Number of backups kept per replaced executable; zero disables
    /// moving executables aside.
    pub fn with_exe_rotate_count(mut self, count: usize) -> Self {
        self.exe_rotate_count = count;
        self
    }

    /// Archive entries with `strip_components` leading components removed.
    fn list_entries(&self, archive: &Path, strip_components: usize) -> UpdateResult<Vec<PathBuf>> {
        let output = Command::new("tar")
            .arg("-tf")
            .arg(archive)
            .output()
            .map_err(|e| UpdateError::ExtractionFailed {
                path: archive.to_path_buf(),
                reason: format!("failed to run tar: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(UpdateError::ExtractionFailed {
                path: archive.to_path_buf(),
                reason: format!("tar listing failed: {}", stderr.trim()),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .map(|line| {
                line.split(['/', '\\'])
                    .filter(|c| !c.is_empty() && *c != ".")
                    .skip(strip_components)
                    .collect::<PathBuf>()
            })
            .filter(|entry| !entry.as_os_str().is_empty())
            .collect())
    }

    /// Move aside every executable in `target_dir` the archive replaces.
    fn rotate_replaced(
        &self,
        archive: &Path,
        target_dir: &Path,
        strip_components: usize,
    ) -> UpdateResult<()> {
        if self.exe_rotate_count == 0 {
            return Ok(());
        }
        for entry in self.list_entries(archive, strip_components)? {
            if !is_executable(&entry) {
                continue;
            }
            let existing = target_dir.join(&entry);
            if !existing.is_file() {
                continue;
            }
            let backup = rotate_executable(&existing, self.exe_rotate_count).map_err(|e| {
                UpdateError::RotateFailed {
                    path: existing.clone(),
                    source: e,
                }
            })?;
            info!(exe = %existing.display(), backup = %backup.display(), "replacing executable");
        }
        Ok(())
    }
}

impl Default for ShellExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Installer for ShellExtractor {
    fn install(
        &self,
        archive: &Path,
        target_dir: &Path,
        strip_components: usize,
    ) -> UpdateResult<()> {
        fs::create_dir_all(target_dir).map_err(|e| UpdateError::CreateDirFailed {
            path: target_dir.to_path_buf(),
            source: e,
        })?;
        self.rotate_replaced(archive, target_dir, strip_components)?;

        let mut command = Command::new("tar");
        command.arg("-xf").arg(archive).arg("-C").arg(target_dir);
        if strip_components > 0 {
            command.arg(format!("--strip-components={strip_components}"));
        }

        let output = command.output().map_err(|e| UpdateError::ExtractionFailed {
            path: archive.to_path_buf(),
            reason: format!("failed to run tar: {e}"),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(UpdateError::ExtractionFailed {
                path: archive.to_path_buf(),
                reason: format!("tar extraction failed: {}", stderr.trim()),
            });
        }

        info!(archive = %archive.display(), target = %target_dir.display(), "archive extracted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn make_tarball(temp: &TempDir) -> std::path::PathBuf {
        let src = temp.path().join("src/vim80-kaoriya-win64");
        fs::create_dir_all(src.join("vim80")).unwrap();
        fs::write(src.join("vim.exe"), b"exe").unwrap();
        fs::write(src.join("vim80/defaults.vim"), b"set nocp").unwrap();

        let archive = temp.path().join("vim.tar");
        let status = Command::new("tar")
            .arg("-cf")
            .arg(&archive)
            .arg("-C")
            .arg(temp.path().join("src"))
            .arg("vim80-kaoriya-win64")
            .status()
            .unwrap();
        assert!(status.success());
        archive
    }

    #[test]
    fn test_install_strips_top_directory() {
        let temp = TempDir::new().unwrap();
        let archive = make_tarball(&temp);
        let target = temp.path().join("target");

        ShellExtractor::new().install(&archive, &target, 1).unwrap();

        assert_eq!(fs::read(target.join("vim.exe")).unwrap(), b"exe");
        assert!(target.join("vim80/defaults.vim").exists());
    }

    #[test]
    fn test_install_without_strip_keeps_layout() {
        let temp = TempDir::new().unwrap();
        let archive = make_tarball(&temp);
        let target = temp.path().join("target");

        ShellExtractor::new().install(&archive, &target, 0).unwrap();

        assert!(target.join("vim80-kaoriya-win64/vim.exe").exists());
    }

    #[test]
    fn test_install_moves_replaced_executables_aside() {
        let temp = TempDir::new().unwrap();
        let archive = make_tarball(&temp);
        let target = temp.path().join("target");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("vim.exe"), b"old").unwrap();
        fs::write(target.join("netupvim.exe"), b"updater").unwrap();

        ShellExtractor::new().install(&archive, &target, 1).unwrap();

        assert_eq!(fs::read(target.join("vim.exe")).unwrap(), b"exe");
        assert_eq!(fs::read(target.join("vim.exe.old.1")).unwrap(), b"old");
        assert_eq!(fs::read(target.join("netupvim.exe")).unwrap(), b"updater");
        assert!(!target.join("netupvim.exe.old.1").exists());
    }

    #[test]
    fn test_repeated_installs_keep_configured_backups() {
        let temp = TempDir::new().unwrap();
        let archive = make_tarball(&temp);
        let target = temp.path().join("target");
        let extractor = ShellExtractor::new().with_exe_rotate_count(2);

        for _ in 0..4 {
            extractor.install(&archive, &target, 1).unwrap();
        }

        assert!(target.join("vim.exe.old.1").exists());
        assert!(target.join("vim.exe.old.2").exists());
        assert!(!target.join("vim.exe.old.3").exists());
    }

    #[test]
    fn test_zero_rotate_count_overwrites_in_place() {
        let temp = TempDir::new().unwrap();
        let archive = make_tarball(&temp);
        let target = temp.path().join("target");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("vim.exe"), b"old").unwrap();

        ShellExtractor::new()
            .with_exe_rotate_count(0)
            .install(&archive, &target, 1)
            .unwrap();

        assert_eq!(fs::read(target.join("vim.exe")).unwrap(), b"exe");
        assert!(!target.join("vim.exe.old.1").exists());
    }

    #[test]
    fn test_list_entries_strips_components() {
        let temp = TempDir::new().unwrap();
        let archive = make_tarball(&temp);

        let entries = ShellExtractor::new().list_entries(&archive, 1).unwrap();

        assert!(entries.contains(&PathBuf::from("vim.exe")));
        assert!(entries.contains(&PathBuf::from("vim80/defaults.vim")));
        assert!(!entries.iter().any(|e| e.starts_with("vim80-kaoriya-win64")));
    }

    #[test]
    fn test_install_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.zip");
        fs::write(&archive, b"definitely not an archive").unwrap();

        let err = ShellExtractor::new()
            .install(&archive, &temp.path().join("target"), 1)
            .unwrap_err();
        assert!(matches!(err, UpdateError::ExtractionFailed { .. }));
    }
}
