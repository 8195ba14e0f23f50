//! Static descriptions of the external tools the conversion pipeline needs.

use std::path::PathBuf;

use doviconvert_common::Os;
use serde::{Deserialize, Serialize};

/// Upstream repository publishing `dovi_tool` release archives.
pub const DEFAULT_DOVI_TOOL_REPOSITORY: &str = "quietvoid/dovi_tool";

/// Where a tool's binary comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolSource {
    /// Downloaded from the latest release of a repository on the release feed.
    GithubRelease { repository: String },
    /// Expected to be installed on the system (`PATH` or a configured path).
    SystemPath,
}

/// One required external tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Bare tool name, also the prefix of its release assets.
    pub name: String,
    /// Platform-suffixed executable file name.
    pub executable: String,
    /// Other executable names accepted when searching `PATH`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    pub source: ToolSource,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, os: Os, source: ToolSource) -> Self {
        let name = name.into();
        Self {
            executable: os.executable_name(&name),
            aliases: Vec::new(),
            name,
            source,
        }
    }

    /// Also accept `alias` (platform-suffixed) when searching `PATH`.
    pub fn with_alias(mut self, os: Os, alias: &str) -> Self {
        self.aliases.push(os.executable_name(alias));
        self
    }

    /// Executable names to try on `PATH`, primary name first.
    pub fn search_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.executable.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// The transcoder, always taken from the system.
    pub fn ffmpeg(os: Os) -> Self {
        Self::new("ffmpeg", os, ToolSource::SystemPath)
    }

    /// The prober used by hosts to read stream side data.
    pub fn ffprobe(os: Os) -> Self {
        Self::new("ffprobe", os, ToolSource::SystemPath)
    }

    /// The Dolby Vision layer converter, provisioned from its releases.
    pub fn dovi_tool(os: Os, repository: impl Into<String>) -> Self {
        Self::new(
            "dovi_tool",
            os,
            ToolSource::GithubRelease {
                repository: repository.into(),
            },
        )
    }

    /// The ISO base-media multiplexer.
    ///
    /// GPAC installs it as `MP4Box`, which is accepted on `PATH`.
    pub fn mp4box(os: Os, source: ToolSource) -> Self {
        Self::new("mp4box", os, source).with_alias(os, "MP4Box")
    }
}

/// The three tools the conversion pipeline invokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCatalog {
    pub ffmpeg: ToolSpec,
    pub dovi_tool: ToolSpec,
    pub mp4box: ToolSpec,
}

impl ToolCatalog {
    /// Catalog with the upstream `dovi_tool` repository and a system `mp4box`.
    pub fn new(os: Os) -> Self {
        Self::with_sources(
            os,
            DEFAULT_DOVI_TOOL_REPOSITORY,
            ToolSource::SystemPath,
        )
    }

    pub fn with_sources(os: Os, dovi_tool_repository: &str, mp4box: ToolSource) -> Self {
        Self {
            ffmpeg: ToolSpec::ffmpeg(os),
            dovi_tool: ToolSpec::dovi_tool(os, dovi_tool_repository),
            mp4box: ToolSpec::mp4box(os, mp4box),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolSpec> {
        [&self.ffmpeg, &self.dovi_tool, &self.mp4box].into_iter()
    }
}

/// Resolved executable paths for every tool in a [`ToolCatalog`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub dovi_tool: PathBuf,
    pub mp4box: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executable_names_follow_os() {
        assert_eq!(ToolSpec::ffmpeg(Os::Windows).executable, "ffmpeg.exe");
        assert_eq!(ToolSpec::ffmpeg(Os::Linux).executable, "ffmpeg");
        let dovi = ToolSpec::dovi_tool(Os::Windows, DEFAULT_DOVI_TOOL_REPOSITORY);
        assert_eq!(dovi.name, "dovi_tool");
        assert_eq!(dovi.executable, "dovi_tool.exe");
    }

    #[test]
    fn mp4box_accepts_gpac_spelling() {
        let mp4box = ToolSpec::mp4box(Os::Linux, ToolSource::SystemPath);
        let names: Vec<&str> = mp4box.search_names().collect();
        assert_eq!(names, vec!["mp4box", "MP4Box"]);
    }

    #[test]
    fn catalog_lists_all_tools() {
        let catalog = ToolCatalog::new(Os::Linux);
        let names: Vec<&str> = catalog.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["ffmpeg", "dovi_tool", "mp4box"]);
        assert_eq!(
            catalog.dovi_tool.source,
            ToolSource::GithubRelease {
                repository: "quietvoid/dovi_tool".into()
            }
        );
        assert_eq!(catalog.mp4box.source, ToolSource::SystemPath);
    }

    #[test]
    fn tool_source_serialization() {
        let json = serde_json::to_string(&ToolSource::GithubRelease {
            repository: "org/repo".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"github_release","repository":"org/repo"}"#);
        let back: ToolSource = serde_json::from_str(r#"{"kind":"system_path"}"#).unwrap();
        assert_eq!(back, ToolSource::SystemPath);
    }
}
