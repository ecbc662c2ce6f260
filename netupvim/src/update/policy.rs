//! Primary update followed by an optional self-update.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::installer::Installer;
use super::orchestrator::{UpdateOutcome, UpdateRequest, Updater};
use crate::arch::{Arch, ArchRequest};
use crate::download::{Downloader, ProgressFn};
use crate::error::UpdateResult;
use crate::github::ReleasesApi;
use crate::source::{Channel, Package, SourceRegistry};

/// Executable whose presence in the target dir opts into self-update.
pub const UPDATER_EXE: &str = "netupvim.exe";

/// The only architecture the updater ships for.
pub const SELF_UPDATE_ARCH: Arch = Arch::X86;

/// Decides whether the updater should update itself after the primary run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfUpdatePolicy {
    enabled: bool,
}

impl SelfUpdatePolicy {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// True when enabled and a previously installed updater exists.
    pub fn should_self_update(&self, target_dir: &Path) -> bool {
        self.enabled && target_dir.join(UPDATER_EXE).is_file()
    }
}

impl Default for SelfUpdatePolicy {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Parameters of a full run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub target_dir: PathBuf,
    pub work_dir: PathBuf,
    pub channel: Channel,
    pub arch: ArchRequest,
    pub force_restore: bool,
    pub self_update: SelfUpdatePolicy,
}

/// Result of the self-update step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelfUpdateStatus {
    /// Policy said no; nothing was attempted.
    Skipped,
    /// Self-update ran.
    Completed(UpdateOutcome),
    /// Self-update failed; the message was logged as a warning.
    Failed(String),
}

/// Summary of a full run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub primary: UpdateOutcome,
    pub self_update: SelfUpdateStatus,
}

impl<D: Downloader, R: ReleasesApi, I: Installer> Updater<D, R, I> {
    /// Update the channel's package, then the updater itself if allowed.
    ///
    /// Any primary failure is returned and the self-update is not attempted.
    /// Self-update failures never fail the run.
    pub fn run(
        &self,
        registry: &SourceRegistry,
        options: &RunOptions,
        progress: Option<&ProgressFn<'_>>,
    ) -> UpdateResult<RunReport> {
        let package = registry.package(options.channel)?;
        let primary = self.update(
            &UpdateRequest {
                target_dir: options.target_dir.clone(),
                work_dir: options.work_dir.clone(),
                arch: options.arch,
                force_restore: options.force_restore,
            },
            package,
            progress,
        )?;

        if !options.self_update.should_self_update(&options.target_dir) {
            return Ok(RunReport {
                primary,
                self_update: SelfUpdateStatus::Skipped,
            });
        }

        info!("trying to update netupvim");
        let self_update = match self.update_self(options, progress) {
            Ok(outcome) => SelfUpdateStatus::Completed(outcome),
            Err(e) => {
                warn!(error = %e, "failed to update netupvim");
                SelfUpdateStatus::Failed(e.to_string())
            }
        };

        Ok(RunReport {
            primary,
            self_update,
        })
    }

    fn update_self(
        &self,
        options: &RunOptions,
        progress: Option<&ProgressFn<'_>>,
    ) -> UpdateResult<UpdateOutcome> {
        let package = Package::netupvim()?;
        self.update(
            &UpdateRequest {
                target_dir: options.target_dir.clone(),
                work_dir: options.work_dir.clone(),
                arch: ArchRequest::Exact(SELF_UPDATE_ARCH),
                force_restore: options.force_restore,
            },
            &package,
            progress,
        )
    }
}
