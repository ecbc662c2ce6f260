//! Update orchestration.
//!
//! ```text
//! Updater::run
//!   ├── update(primary package)      resolve arch ─► source ─► fetch ─► install
//!   └── update(netupvim, x86)        only if SelfUpdatePolicy allows
//! ```
//!
//! A primary failure ends the run. A self-update failure is logged and
//! reported, never returned.

mod anchor;
mod installer;
mod orchestrator;
mod policy;
mod rotate;

pub use anchor::{AnchorStore, ANCHOR_DIR};
pub use installer::{Installer, ShellExtractor};
pub use orchestrator::{UpdateOutcome, UpdateRequest, Updater, DOWNLOAD_DIR};
pub use policy::{
    RunOptions, RunReport, SelfUpdatePolicy, SelfUpdateStatus, SELF_UPDATE_ARCH, UPDATER_EXE,
};
pub use rotate::{backup_path, rotate_executable, DEFAULT_EXE_ROTATE_COUNT};
