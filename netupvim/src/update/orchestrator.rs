//! Single-package update: resolve, fetch conditionally, install.

use std::path::PathBuf;

use chrono::Utc;
use tracing::info;

use super::anchor::AnchorStore;
use super::installer::Installer;
use crate::arch::{Arch, ArchRequest};
use crate::download::{Downloader, ProgressFn};
use crate::error::{UpdateError, UpdateResult};
use crate::github::ReleasesApi;
use crate::source::{FetchContext, Package};

/// Subdirectory of the work dir that receives downloaded archives.
pub const DOWNLOAD_DIR: &str = "tmp";

/// Parameters of one package update.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    /// Directory the package is installed into.
    pub target_dir: PathBuf,
    /// Scratch directory for downloads and anchors.
    pub work_dir: PathBuf,
    /// Requested architecture.
    pub arch: ArchRequest,
    /// Ignore the last-update time and fetch unconditionally.
    pub force_restore: bool,
}

/// What an update did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A new archive was downloaded and installed.
    Installed { arch: Arch, archive: PathBuf },
    /// Nothing changed upstream since the last install.
    UpToDate { arch: Arch },
}

/// Package updater.
///
/// Wires a downloader, a releases API and an installer together. The same
/// updater serves the primary package and the self-update package.
pub struct Updater<D: Downloader, R: ReleasesApi, I: Installer> {
    downloader: D,
    releases: R,
    installer: I,
}

impl<D: Downloader, R: ReleasesApi, I: Installer> Updater<D, R, I> {
    pub fn new(downloader: D, releases: R, installer: I) -> Self {
        Self {
            downloader,
            releases,
            installer,
        }
    }

    pub fn downloader(&self) -> &D {
        &self.downloader
    }

    pub fn releases(&self) -> &R {
        &self.releases
    }

    pub fn installer(&self) -> &I {
        &self.installer
    }

    /// Update `package` in `request.target_dir`.
    ///
    /// The installer is only called with a fully downloaded archive. When the
    /// source reports no change the outcome is [`UpdateOutcome::UpToDate`].
    pub fn update(
        &self,
        request: &UpdateRequest,
        package: &Package,
        progress: Option<&ProgressFn<'_>>,
    ) -> UpdateResult<UpdateOutcome> {
        let hint = package.arch_hint().map(|exe| request.target_dir.join(exe));
        let arch = request.arch.resolve(hint.as_deref())?;
        let source = package.source(arch)?;

        let anchors = AnchorStore::new(&request.work_dir);
        let pivot = if request.force_restore {
            None
        } else {
            anchors.read(package.name())
        };

        info!(
            package = package.name(),
            %arch,
            %source,
            pivot = ?pivot,
            "checking for update"
        );

        let started = Utc::now();
        let ctx = FetchContext::new(&self.downloader, &self.releases);
        let download_dir = request.work_dir.join(DOWNLOAD_DIR);

        let archive = match source.fetch(&ctx, &download_dir, pivot, progress) {
            Ok(path) => path,
            Err(UpdateError::NotModified) => {
                info!(package = package.name(), "already up to date");
                return Ok(UpdateOutcome::UpToDate { arch });
            }
            Err(e) => return Err(e),
        };

        self.installer
            .install(&archive, &request.target_dir, package.strip_components())?;
        anchors.record(package.name(), started)?;

        info!(package = package.name(), archive = %archive.display(), "update installed");
        Ok(UpdateOutcome::Installed { arch, archive })
    }
}
