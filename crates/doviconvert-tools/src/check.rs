//! Availability checks for resolved tools.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

/// Information about an external tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

impl ToolInfo {
    /// A tool that could not be resolved.
    pub fn missing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        }
    }
}

/// Run the executable at `path` with its version flag and report the result.
///
/// ffmpeg-family tools take `-version`, mp4box takes `-version` as well;
/// everything else answers to `--version`.
pub fn check_tool(name: &str, path: &Path) -> ToolInfo {
    let version_arg = match name {
        "ffmpeg" | "ffprobe" | "mp4box" => "-version",
        _ => "--version",
    };

    match Command::new(path).arg(version_arg).output() {
        Ok(output) if output.status.success() => {
            // MP4Box prints its banner on stderr.
            let text = if output.stdout.is_empty() {
                output.stderr
            } else {
                output.stdout
            };
            let version = String::from_utf8_lossy(&text)
                .lines()
                .next()
                .map(|s| s.trim().to_string());

            ToolInfo {
                name: name.to_string(),
                available: true,
                version,
                path: Some(path.to_path_buf()),
            }
        }
        _ => ToolInfo::missing(name),
    }
}
