//! netupvim CLI - Upgrade or install Vim (+kaoriya)
//!
//! Reads `netupvim.ini` next to the executable, applies command-line
//! overrides, and runs one update of the selected channel followed by an
//! optional self-update.

mod error;
mod progress;
mod settings;

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use netupvim::config::{default_config_path, ConfigFile};
use netupvim::download::{HttpDownloader, ProgressFn};
use netupvim::github::GithubClient;
use netupvim::logging::{init_logging, LogConfig};
use netupvim::source::SourceRegistry;
use netupvim::update::{RunReport, SelfUpdateStatus, ShellExtractor, UpdateOutcome, Updater};

use error::CliError;
use progress::DownloadProgress;
use settings::Settings;

/// Upgrade or install Vim (+kaoriya) into a target directory.
#[derive(Parser, Debug)]
#[command(name = "netupvim", version, about, long_about = None)]
pub struct Args {
    /// Directory to install into [config: target_dir, default: .]
    #[arg(short = 't', long = "target", value_name = "DIR")]
    pub target: Option<PathBuf>,

    /// Update channel: release, develop or canary [config: source]
    #[arg(short = 's', long = "source", value_name = "CHANNEL")]
    pub source: Option<String>,

    /// CPU architecture: x86, amd64 or auto [config: cpu]
    #[arg(long, value_name = "ARCH")]
    pub cpu: Option<String>,

    /// Ignore the last update time and download unconditionally
    #[arg(long)]
    pub restore: bool,

    /// Configuration file [default: netupvim.ini next to the executable]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(&args) {
        e.exit();
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let config = ConfigFile::load(&config_path)?;
    let settings = Settings::resolve(args, &config)?;

    let _guard = init_logging(&LogConfig::new(
        &settings.work_dir,
        settings.log_rotate_count,
    ))?;
    info!(
        config = %config_path.display(),
        target = %settings.target_dir.display(),
        source = %settings.channel,
        restore = settings.force_restore,
        "netupvim {}",
        env!("CARGO_PKG_VERSION")
    );

    let downloader = HttpDownloader::with_timeout(settings.download_timeout)?;
    let releases = GithubClient::with_timeout(settings.download_timeout)?
        .with_credentials(settings.credentials.clone())
        .with_verbose(settings.github_verbose);
    let installer = ShellExtractor::new().with_exe_rotate_count(settings.exe_rotate_count);
    let updater = Updater::new(downloader, releases, installer);
    let registry = SourceRegistry::builtin()?;

    let progress = DownloadProgress::new();
    let report_progress: &ProgressFn<'_> = &|done, total| progress.report(done, total);
    let result = updater.run(&registry, &settings.run_options(), Some(report_progress));
    progress.finish();

    print_report(&result?);
    Ok(())
}

fn print_report(report: &RunReport) {
    match &report.primary {
        UpdateOutcome::Installed { arch, archive } => {
            println!("Updated ({}) from {}", arch, archive.display());
        }
        UpdateOutcome::UpToDate { arch } => {
            println!("Already up to date ({})", arch);
        }
    }
    match &report.self_update {
        SelfUpdateStatus::Skipped => {}
        SelfUpdateStatus::Completed(UpdateOutcome::Installed { .. }) => {
            println!("netupvim updated");
        }
        SelfUpdateStatus::Completed(UpdateOutcome::UpToDate { .. }) => {}
        SelfUpdateStatus::Failed(reason) => {
            println!("Warning: failed to update netupvim: {}", reason);
        }
    }
}
