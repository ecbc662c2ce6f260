//! `netupvim.ini` configuration file.
//!
//! All keys live in the general (section-less) part of the file:
//!
//! ```ini
//! target_dir = C:\vim
//! source = release
//! cpu = amd64
//! disable_self_update = false
//! download_timeout = 300
//! github_user = koron
//! github_token = ghp_xxx
//! github_verbose = false
//! log_rotate_count = 5
//! exe_rotate_count = 5
//! ```
//!
//! A missing file is not an error; every key has a default. Backslashes are
//! literal, so Windows paths need no escaping.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::download::DEFAULT_TIMEOUT_SECS;
use crate::github::GithubCredentials;
use crate::update::DEFAULT_EXE_ROTATE_COUNT;

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "netupvim.ini";

/// Default number of rotated log files kept.
pub const DEFAULT_LOG_ROTATE_COUNT: usize = 5;

/// Errors reading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read or parsed.
    #[error("failed to load {}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    /// A key has a value of the wrong shape.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Contents of `netupvim.ini`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub target_dir: Option<PathBuf>,
    pub source: Option<String>,
    pub cpu: Option<String>,
    pub disable_self_update: bool,
    pub download_timeout_secs: Option<u64>,
    pub github_user: Option<String>,
    pub github_token: Option<String>,
    pub github_verbose: bool,
    pub log_rotate_count: Option<usize>,
    pub exe_rotate_count: Option<usize>,
}

impl ConfigFile {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file_noescape(path).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_ini(&ini)
    }

    /// Parse from INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str_noescape(text).map_err(|e| ConfigError::Load {
            path: PathBuf::from("<string>"),
            source: ini::Error::Parse(e),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let general = ini.general_section();
        let get = |key: &str| {
            general
                .get(key)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Ok(Self {
            target_dir: get("target_dir").map(PathBuf::from),
            source: get("source"),
            cpu: get("cpu"),
            disable_self_update: parse_bool("disable_self_update", get("disable_self_update"))?,
            download_timeout_secs: parse_number("download_timeout", get("download_timeout"))?,
            github_user: get("github_user"),
            github_token: get("github_token"),
            github_verbose: parse_bool("github_verbose", get("github_verbose"))?,
            log_rotate_count: parse_number("log_rotate_count", get("log_rotate_count"))?,
            exe_rotate_count: parse_number("exe_rotate_count", get("exe_rotate_count"))?,
        })
    }

    /// Directory to install into.
    pub fn target_dir(&self) -> PathBuf {
        self.target_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Update channel name.
    pub fn source(&self) -> &str {
        self.source.as_deref().unwrap_or("release")
    }

    /// Requested CPU; empty means auto-detect.
    pub fn cpu(&self) -> &str {
        self.cpu.as_deref().unwrap_or("")
    }

    /// Timeout applied to every network transfer.
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(
            self.download_timeout_secs
                .filter(|&secs| secs > 0)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Credentials for the releases API, when a token is configured.
    pub fn github_credentials(&self) -> Option<GithubCredentials> {
        self.github_token.clone().map(|token| GithubCredentials {
            user: self.github_user.clone(),
            token,
        })
    }

    /// Number of log files kept by rotation.
    pub fn log_rotate_count(&self) -> usize {
        self.log_rotate_count
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_LOG_ROTATE_COUNT)
    }

    /// Number of backups kept for each executable replaced by an install.
    pub fn exe_rotate_count(&self) -> usize {
        self.exe_rotate_count
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_EXE_ROTATE_COUNT)
    }
}

/// Default location: next to the running executable.
pub fn default_config_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

fn parse_bool(key: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}

fn parse_number<T>(key: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.parse::<T>().map_err(|e| ConfigError::InvalidValue {
                key,
                value: v.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}
