//! Effective settings: command-line flags over `netupvim.ini` over defaults.

use std::path::PathBuf;
use std::time::Duration;

use netupvim::arch::ArchRequest;
use netupvim::config::ConfigFile;
use netupvim::github::GithubCredentials;
use netupvim::source::Channel;
use netupvim::update::{RunOptions, SelfUpdatePolicy};

use crate::error::CliError;
use crate::Args;

/// Name of the work directory created inside the target directory.
pub const WORK_DIR_NAME: &str = "netupvim";

#[derive(Debug, Clone)]
pub struct Settings {
    pub target_dir: PathBuf,
    pub work_dir: PathBuf,
    pub channel: Channel,
    pub arch: ArchRequest,
    pub force_restore: bool,
    pub self_update: SelfUpdatePolicy,
    pub download_timeout: Duration,
    pub credentials: Option<GithubCredentials>,
    pub github_verbose: bool,
    pub log_rotate_count: usize,
    pub exe_rotate_count: usize,
}

impl Settings {
    pub fn resolve(args: &Args, config: &ConfigFile) -> Result<Self, CliError> {
        let target_dir = args.target.clone().unwrap_or_else(|| config.target_dir());

        let source = args.source.as_deref().unwrap_or_else(|| config.source());
        let channel = source
            .parse::<Channel>()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let cpu = args.cpu.as_deref().unwrap_or_else(|| config.cpu());
        let arch = ArchRequest::parse(cpu).map_err(|e| CliError::Config(e.to_string()))?;

        Ok(Self {
            work_dir: target_dir.join(WORK_DIR_NAME),
            target_dir,
            channel,
            arch,
            force_restore: args.restore,
            self_update: SelfUpdatePolicy::new(!config.disable_self_update),
            download_timeout: config.download_timeout(),
            credentials: config.github_credentials(),
            github_verbose: config.github_verbose,
            log_rotate_count: config.log_rotate_count(),
            exe_rotate_count: config.exe_rotate_count(),
        })
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            target_dir: self.target_dir.clone(),
            work_dir: self.work_dir.clone(),
            channel: self.channel,
            arch: self.arch,
            force_restore: self.force_restore,
            self_update: self.self_update,
        }
    }
}
