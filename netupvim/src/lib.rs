//! netupvim - Vim (+kaoriya) updater for Windows
//!
//! This library resolves which archive a channel and CPU architecture map
//! to, fetches it only when it changed upstream, and installs it into a
//! target directory. The updater can also update itself from its own
//! hosted releases.
//!
//! # Example
//!
//! ```ignore
//! use netupvim::arch::ArchRequest;
//! use netupvim::download::HttpDownloader;
//! use netupvim::github::GithubClient;
//! use netupvim::source::{Channel, SourceRegistry};
//! use netupvim::update::{RunOptions, SelfUpdatePolicy, ShellExtractor, Updater};
//!
//! let updater = Updater::new(HttpDownloader::new()?, GithubClient::new()?, ShellExtractor::new());
//! let report = updater.run(
//!     &SourceRegistry::builtin()?,
//!     &RunOptions {
//!         target_dir: "C:\\vim".into(),
//!         work_dir: "C:\\vim\\netupvim".into(),
//!         channel: Channel::Release,
//!         arch: ArchRequest::Auto,
//!         force_restore: false,
//!         self_update: SelfUpdatePolicy::default(),
//!     },
//!     None,
//! )?;
//! ```

pub mod arch;
pub mod config;
pub mod download;
pub mod error;
pub mod github;
pub mod logging;
pub mod source;
pub mod update;

#[cfg(test)]
mod testing;

pub use error::{UpdateError, UpdateResult};

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = concat!("netupvim/", env!("CARGO_PKG_VERSION"));
