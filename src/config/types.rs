use doviconvert_common::Os;
use doviconvert_tools::{ToolCatalog, ToolSource, DEFAULT_DOVI_TOOL_REPOSITORY, DEFAULT_RELEASE_API};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub conversion: ConversionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Cache root; provisioned binaries land in `<root>/bin/<os>/`
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Base URL of the release feed API
    #[serde(default = "default_release_api")]
    pub release_api: String,

    /// `owner/name` of the repository publishing dovi_tool archives
    #[serde(default = "default_dovi_tool_repository")]
    pub dovi_tool_repository: String,

    /// Publish MP4Box from a release feed instead of the system PATH
    #[serde(default)]
    pub mp4box_repository: Option<String>,

    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    #[serde(default)]
    pub dovi_tool_path: Option<PathBuf>,

    #[serde(default)]
    pub mp4box_path: Option<PathBuf>,

    /// Upper bound for provisioning all tools (default: 600)
    #[serde(default = "default_provision_timeout")]
    pub provision_timeout_secs: u64,
}

fn default_root() -> PathBuf {
    PathBuf::from("~/.local/share/doviconvert")
}

fn default_release_api() -> String {
    DEFAULT_RELEASE_API.to_string()
}

fn default_dovi_tool_repository() -> String {
    DEFAULT_DOVI_TOOL_REPOSITORY.to_string()
}

fn default_provision_timeout() -> u64 {
    600
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            release_api: default_release_api(),
            dovi_tool_repository: default_dovi_tool_repository(),
            mp4box_repository: None,
            ffmpeg_path: None,
            ffprobe_path: None,
            dovi_tool_path: None,
            mp4box_path: None,
            provision_timeout_secs: default_provision_timeout(),
        }
    }
}

impl ToolsConfig {
    /// Cache root with `~` expanded.
    pub fn root_dir(&self) -> PathBuf {
        expand(&self.root)
    }

    pub fn provision_timeout(&self) -> Duration {
        Duration::from_secs(self.provision_timeout_secs)
    }

    /// Tool catalog for `os` as configured.
    pub fn catalog(&self, os: Os) -> ToolCatalog {
        let mp4box = match &self.mp4box_repository {
            Some(repository) => ToolSource::GithubRelease {
                repository: repository.clone(),
            },
            None => ToolSource::SystemPath,
        };
        ToolCatalog::with_sources(os, &self.dovi_tool_repository, mp4box)
    }

    /// Configured path overrides keyed by tool name.
    pub fn overrides(&self) -> Vec<(&'static str, PathBuf)> {
        [
            ("ffmpeg", &self.ffmpeg_path),
            ("ffprobe", &self.ffprobe_path),
            ("dovi_tool", &self.dovi_tool_path),
            ("mp4box", &self.mp4box_path),
        ]
        .into_iter()
        .filter_map(|(name, path)| path.as_ref().map(|p| (name, expand(p))))
        .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConversionConfig {
    /// Directory for intermediate files (default: system temp dir)
    #[serde(default)]
    pub work_dir: Option<PathBuf>,

    /// Keep intermediate streams after a successful conversion
    #[serde(default)]
    pub keep_intermediates: bool,

    /// Per-step timeout in seconds; 0 disables it
    #[serde(default)]
    pub step_timeout_secs: u64,
}

impl ConversionConfig {
    pub fn work_dir(&self) -> PathBuf {
        match &self.work_dir {
            Some(dir) => expand(dir),
            None => std::env::temp_dir().join("doviconvert"),
        }
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        (self.step_timeout_secs > 0).then(|| Duration::from_secs(self.step_timeout_secs))
    }
}

fn expand(path: &std::path::Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}
