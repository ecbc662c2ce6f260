//! Built-in source table.
//!
//! The table is two-level: a [`Channel`] selects a [`Package`], and the
//! package maps each supported [`Arch`] to a [`Source`]. Adding a channel or
//! an architecture means adding an entry here; lookup never changes.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::{DirectSource, GithubSource, Source};
use crate::arch::Arch;
use crate::error::{UpdateError, UpdateResult};

const KAORIYA_OWNER: &str = "koron";
const KAORIYA_PROJECT: &str = "vim-kaoriya";
const KAORIYA_FILES: &str = "http://files.kaoriya.net/vim";

/// Executable whose header decides the architecture of the Vim package.
const VIM_HINT: &str = "vim.exe";

/// Update channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Tagged releases.
    Release,
    /// Development snapshots.
    Develop,
    /// Test builds.
    Canary,
}

impl Channel {
    /// All channels, in table order.
    pub fn all() -> [Channel; 3] {
        [Self::Release, Self::Develop, Self::Canary]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Release => "release",
            Self::Develop => "develop",
            Self::Canary => "canary",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Names are matched exactly; `Release` or ` release` are unknown channels.
impl FromStr for Channel {
    type Err = UpdateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "release" => Ok(Self::Release),
            "develop" => Ok(Self::Develop),
            "canary" => Ok(Self::Canary),
            _ => Err(UpdateError::UnknownChannel(s.to_string())),
        }
    }
}

/// One installable package: its per-architecture sources and install layout.
#[derive(Debug, Clone)]
pub struct Package {
    name: String,
    /// Leading path components dropped when extracting.
    strip_components: usize,
    /// Installed executable used to detect the architecture.
    arch_hint: Option<String>,
    sources: HashMap<Arch, Source>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strip_components: 0,
            arch_hint: None,
            sources: HashMap::new(),
        }
    }

    pub fn with_source(mut self, arch: Arch, source: Source) -> Self {
        self.sources.insert(arch, source);
        self
    }

    pub fn with_strip_components(mut self, count: usize) -> Self {
        self.strip_components = count;
        self
    }

    pub fn with_arch_hint(mut self, executable: impl Into<String>) -> Self {
        self.arch_hint = Some(executable.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strip_components(&self) -> usize {
        self.strip_components
    }

    pub fn arch_hint(&self) -> Option<&str> {
        self.arch_hint.as_deref()
    }

    /// Source for `arch`, or [`UpdateError::SourceNotFound`].
    pub fn source(&self, arch: Arch) -> UpdateResult<&Source> {
        self.sources
            .get(&arch)
            .ok_or_else(|| UpdateError::SourceNotFound {
                package: self.name.clone(),
                arch: arch.to_string(),
            })
    }

    /// Architectures this package ships for.
    pub fn arches(&self) -> impl Iterator<Item = Arch> + '_ {
        self.sources.keys().copied()
    }

    /// The updater itself. Ships for x86 only, whatever Vim's architecture.
    pub fn netupvim() -> UpdateResult<Self> {
        Ok(Self::new("netupvim")
            .with_strip_components(1)
            .with_source(
                Arch::X86,
                Source::GitHub(GithubSource::new(
                    KAORIYA_OWNER,
                    "netupvim",
                    r"^netupvim-.*\.zip$",
                )?),
            ))
    }

    fn vim_release() -> UpdateResult<Self> {
        Ok(Self::new("vim-release")
            .with_strip_components(1)
            .with_arch_hint(VIM_HINT)
            .with_source(
                Arch::X86,
                Source::GitHub(GithubSource::new(
                    KAORIYA_OWNER,
                    KAORIYA_PROJECT,
                    r"-win32-.*\.zip$",
                )?),
            )
            .with_source(
                Arch::Amd64,
                Source::GitHub(GithubSource::new(
                    KAORIYA_OWNER,
                    KAORIYA_PROJECT,
                    r"-win64-.*\.zip$",
                )?),
            ))
    }

    fn vim_direct(name: &str, suffix: &str) -> Self {
        Self::new(name)
            .with_strip_components(1)
            .with_arch_hint(VIM_HINT)
            .with_source(
                Arch::X86,
                Source::Direct(DirectSource::new(format!(
                    "{KAORIYA_FILES}/vim74-kaoriya-win32{suffix}.zip"
                ))),
            )
            .with_source(
                Arch::Amd64,
                Source::Direct(DirectSource::new(format!(
                    "{KAORIYA_FILES}/vim74-kaoriya-win64{suffix}.zip"
                ))),
            )
    }
}

/// Channel × architecture lookup of Vim sources.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    packages: HashMap<Channel, Package>,
}

impl SourceRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The compiled-in table for Vim (+kaoriya).
    pub fn builtin() -> UpdateResult<Self> {
        Ok(Self::new()
            .with_package(Channel::Release, Package::vim_release()?)
            .with_package(Channel::Develop, Package::vim_direct("vim-develop", ""))
            .with_package(Channel::Canary, Package::vim_direct("vim-canary", "-test")))
    }

    pub fn with_package(mut self, channel: Channel, package: Package) -> Self {
        self.packages.insert(channel, package);
        self
    }

    /// Package row for `channel`.
    pub fn package(&self, channel: Channel) -> UpdateResult<&Package> {
        self.packages
            .get(&channel)
            .ok_or_else(|| UpdateError::SourceNotFound {
                package: channel.to_string(),
                arch: "any".to_string(),
            })
    }

    /// Source for `(channel, arch)`. Pure table read.
    pub fn resolve(&self, channel: Channel, arch: Arch) -> UpdateResult<&Source> {
        self.packages
            .get(&channel)
            .and_then(|package| package.sources.get(&arch))
            .ok_or_else(|| UpdateError::SourceNotFound {
                package: channel.to_string(),
                arch: arch.to_string(),
            })
    }
}
