//! CPU architecture selection.
//!
//! The requested architecture comes from configuration and may be empty or
//! `auto`. It is resolved once, before any source lookup, into a concrete
//! [`Arch`]; nothing downstream ever sees the `auto` form.
//!
//! Auto-detection prefers the architecture of an already installed
//! executable (read from its PE header) so an existing 32-bit install keeps
//! receiving 32-bit updates on a 64-bit machine. Without such a hint it falls
//! back to the process environment.

use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::error::{UpdateError, UpdateResult};

/// PE machine type for 32-bit x86 images.
const IMAGE_FILE_MACHINE_I386: u16 = 0x014c;

/// PE machine type for x86-64 images.
const IMAGE_FILE_MACHINE_AMD64: u16 = 0x8664;

/// Offset of `e_lfanew` in the DOS header.
const PE_POINTER_OFFSET: u64 = 0x3c;

/// Concrete architecture of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// 32-bit x86.
    X86,
    /// 64-bit x86.
    Amd64,
}

impl Arch {
    /// Short lowercase name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::Amd64 => "amd64",
        }
    }

    /// Map a CPU name as spelled by users, Windows or Rust targets.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "x86" | "386" | "i386" | "i686" | "win32" => Some(Self::X86),
            "amd64" | "x64" | "x86_64" | "win64" => Some(Self::Amd64),
            _ => None,
        }
    }

    fn from_pe_machine(machine: u16) -> Option<Self> {
        match machine {
            IMAGE_FILE_MACHINE_I386 => Some(Self::X86),
            IMAGE_FILE_MACHINE_AMD64 => Some(Self::Amd64),
            _ => None,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Architecture as requested by configuration or flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchRequest {
    /// Detect from an installed executable or the environment.
    #[default]
    Auto,
    /// Use exactly this architecture.
    Exact(Arch),
}

impl ArchRequest {
    /// Parse a requested CPU name. Empty and `auto` mean [`ArchRequest::Auto`].
    pub fn parse(name: &str) -> UpdateResult<Self> {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        Arch::from_name(trimmed)
            .map(Self::Exact)
            .ok_or_else(|| UpdateError::UnsupportedArchitecture(trimmed.to_string()))
    }

    /// Resolve to a concrete architecture.
    ///
    /// `hint` names an executable whose PE header decides the architecture
    /// when it exists. Otherwise the native architecture is probed.
    pub fn resolve(self, hint: Option<&Path>) -> UpdateResult<Arch> {
        match self {
            Self::Exact(arch) => Ok(arch),
            Self::Auto => {
                if let Some(arch) = hint.and_then(probe_executable) {
                    debug!(arch = %arch, "architecture detected from installed executable");
                    return Ok(arch);
                }
                probe_native()
            }
        }
    }
}

impl FromStr for ArchRequest {
    type Err = UpdateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Read the machine type from a PE image.
///
/// Returns `None` if the file is missing or not a recognizable PE image.
pub fn probe_executable(path: &Path) -> Option<Arch> {
    let mut file = File::open(path).ok()?;

    let mut mz = [0u8; 2];
    file.read_exact(&mut mz).ok()?;
    if &mz != b"MZ" {
        debug!(path = %path.display(), "hint is not a DOS/PE image");
        return None;
    }

    file.seek(SeekFrom::Start(PE_POINTER_OFFSET)).ok()?;
    let mut pointer = [0u8; 4];
    file.read_exact(&mut pointer).ok()?;
    let pe_offset = u32::from_le_bytes(pointer);

    file.seek(SeekFrom::Start(u64::from(pe_offset))).ok()?;
    let mut header = [0u8; 6];
    file.read_exact(&mut header).ok()?;
    if &header[..4] != b"PE\0\0" {
        return None;
    }

    Arch::from_pe_machine(u16::from_le_bytes([header[4], header[5]]))
}

/// Detect the architecture the process runs on.
fn probe_native() -> UpdateResult<Arch> {
    // A 32-bit process on 64-bit Windows sees x86 in PROCESSOR_ARCHITECTURE.
    let windows = std::env::var("PROCESSOR_ARCHITEW6432")
        .or_else(|_| std::env::var("PROCESSOR_ARCHITECTURE"))
        .ok();
    native_arch(windows.as_deref(), std::env::consts::ARCH)
}

fn native_arch(windows_env: Option<&str>, target_arch: &str) -> UpdateResult<Arch> {
    let name = windows_env.unwrap_or(target_arch);
    Arch::from_name(name).ok_or_else(|| UpdateError::UnsupportedArchitecture(name.to_string()))
}
