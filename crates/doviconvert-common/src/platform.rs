//! Platform detection for release-asset matching.
//!
//! The operating system is a closed set; anything outside it is rejected here
//! so that asset-name construction can match exhaustively. Architecture names
//! are normalized through a fixed table and otherwise passed through.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Operating systems that have published tool binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Windows,
    Linux,
    #[serde(rename = "darwin")]
    MacOs,
}

impl Os {
    /// Lowercase directory name used for the binary cache.
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Windows => "windows",
            Os::Linux => "linux",
            Os::MacOs => "darwin",
        }
    }

    /// Executable suffix for this OS.
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            Os::Windows => ".exe",
            Os::Linux | Os::MacOs => "",
        }
    }

    /// Append the platform executable suffix to a bare tool name.
    pub fn executable_name(&self, name: &str) -> String {
        format!("{}{}", name, self.exe_suffix())
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Architecture aliases mapped to their canonical release-asset spelling.
const ARCH_ALIASES: &[(&str, &str)] = &[
    ("amd64", "x86_64"),
    ("x64", "x86_64"),
    ("x86-64", "x86_64"),
    ("arm64", "aarch64"),
    ("armv8", "aarch64"),
    ("i386", "i686"),
    ("x86", "i686"),
];

/// Canonical platform identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformId {
    pub os: Os,
    pub arch: String,
}

impl PlatformId {
    /// Resolve the platform of the running process.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] on any OS other than Windows,
    /// Linux, or macOS.
    pub fn resolve() -> Result<Self> {
        Self::resolve_from(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Resolve a platform from raw OS and architecture strings.
    pub fn resolve_from(os: &str, arch: &str) -> Result<Self> {
        let os = match os.to_ascii_lowercase().as_str() {
            "windows" => Os::Windows,
            "linux" => Os::Linux,
            "macos" | "darwin" => Os::MacOs,
            other => {
                return Err(Error::UnsupportedPlatform {
                    os: other.to_string(),
                })
            }
        };

        let platform = Self {
            os,
            arch: normalize_arch(arch),
        };
        tracing::debug!(%platform, "resolved platform");
        Ok(platform)
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// Normalize an architecture name; unmapped names are returned unchanged.
pub fn normalize_arch(arch: &str) -> String {
    let lowered = arch.to_ascii_lowercase();
    ARCH_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or_else(|| arch.to_string())
}
