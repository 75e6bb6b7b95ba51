use crate::error::{Result, SetupError};
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    Darwin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X64,
    Arm64,
}

/// The `{os}-{arch}` pair used to name published fluence archives, e.g. `linux-x64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformKey {
    pub os: Os,
    pub arch: Arch,
}

pub const SUPPORTED_PLATFORMS: [&str; 4] =
    ["linux-x64", "linux-arm64", "darwin-x64", "darwin-arm64"];

impl PlatformKey {
    /// Detects the platform of the running host.
    pub fn detect() -> Result<Self> {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Normalizes an OS/architecture pair. Both Rust (`macos`, `x86_64`, `aarch64`) and
    /// release-naming (`darwin`, `x64`, `arm64`) spellings are accepted.
    pub fn from_parts(os: &str, arch: &str) -> Result<Self> {
        let parsed_os = match os {
            "linux" => Some(Os::Linux),
            "macos" | "darwin" => Some(Os::Darwin),
            _ => None,
        };
        let parsed_arch = match arch {
            "x86_64" | "x64" | "amd64" => Some(Arch::X64),
            "aarch64" | "arm64" => Some(Arch::Arm64),
            _ => None,
        };

        match (parsed_os, parsed_arch) {
            (Some(os), Some(arch)) => Ok(Self { os, arch }),
            _ => Err(SetupError::UnsupportedPlatform {
                platform: format!("{os}-{arch}"),
                supported: SUPPORTED_PLATFORMS.join(", "),
            }),
        }
    }

    /// File name of the channel tarball for this platform.
    pub fn tarball_name(&self) -> String {
        format!("fluence-{self}.tar.gz")
    }

    /// File name of the version index for this platform.
    pub fn version_index_name(&self) -> String {
        format!("fluence-{self}-tar-gz.json")
    }
}

impl Display for PlatformKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let os = match self.os {
            Os::Linux => "linux",
            Os::Darwin => "darwin",
        };
        let arch = match self.arch {
            Arch::X64 => "x64",
            Arch::Arm64 => "arm64",
        };
        write!(f, "{os}-{arch}")
    }
}
