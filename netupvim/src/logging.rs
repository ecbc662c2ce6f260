//! Logging setup.
//!
//! Human-readable output goes to stderr. A copy of every event is written
//! to a daily rolling file under the work directory's `log` folder, keeping
//! at most `rotate_count` files.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::{fmt, EnvFilter};

/// Subdirectory of the work dir holding log files.
pub const LOG_DIR: &str = "log";

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "netupvim=info";

const LOG_FILE_PREFIX: &str = "netupvim";
const LOG_FILE_SUFFIX: &str = "log";

#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to create log directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open log file")]
    Appender(#[from] InitError),

    #[error("failed to install log subscriber")]
    Init(#[from] TryInitError),
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_dir: PathBuf,
    pub rotate_count: usize,
    /// Filter directive, overridden by `RUST_LOG`.
    pub filter: String,
}

impl LogConfig {
    pub fn new(work_dir: &Path, rotate_count: usize) -> Self {
        Self {
            log_dir: work_dir.join(LOG_DIR),
            rotate_count: rotate_count.max(1),
            filter: DEFAULT_FILTER.to_string(),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.filter))
    }

    fn appender(&self) -> Result<RollingFileAppender, LogError> {
        fs::create_dir_all(&self.log_dir).map_err(|e| LogError::CreateDir {
            path: self.log_dir.clone(),
            source: e,
        })?;
        Ok(RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .filename_suffix(LOG_FILE_SUFFIX)
            .max_log_files(self.rotate_count)
            .build(&self.log_dir)?)
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held until
/// the program exits.
pub fn init_logging(config: &LogConfig) -> Result<WorkerGuard, LogError> {
    let (file_writer, guard) = tracing_appender::non_blocking(config.appender()?);

    // File timestamps use the local offset when it can be determined.
    let (local_file_layer, utc_file_layer) = match OffsetTime::local_rfc_3339() {
        Ok(timer) => (
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_timer(timer)
                    .with_writer(file_writer),
            ),
            None,
        ),
        Err(_) => (
            None,
            Some(fmt::layer().with_ansi(false).with_writer(file_writer)),
        ),
    };

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(local_file_layer)
        .with(utc_file_layer)
        .try_init()?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_paths() {
        let config = LogConfig::new(Path::new("/opt/vim/netupvim"), 5);
        assert_eq!(config.log_dir, PathBuf::from("/opt/vim/netupvim/log"));
        assert_eq!(config.rotate_count, 5);
        assert_eq!(config.filter, DEFAULT_FILTER);
    }

    #[test]
    fn test_rotate_count_is_at_least_one() {
        let config = LogConfig::new(Path::new("."), 0);
        assert_eq!(config.rotate_count, 1);
    }

    #[test]
    fn test_appender_creates_log_dir() {
        let temp = tempfile::tempdir().unwrap();
        let config = LogConfig::new(temp.path(), 3);

        config.appender().unwrap();

        assert!(temp.path().join(LOG_DIR).is_dir());
    }
}
