//! Common error types used throughout doviconvert.
//!
//! Provisioning, probing, and orchestration failures all funnel into a single
//! [`Error`] so the host can surface them unchanged as a processing failure for
//! the file being converted.

use std::path::PathBuf;

/// Common error type for doviconvert.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The running operating system has no release assets.
    #[error("Unsupported platform: {os}")]
    UnsupportedPlatform { os: String },

    /// A release feed query or asset download failed.
    #[error("Network error [{url}]: {message}")]
    Network { url: String, message: String },

    /// The latest release carries no asset for this platform.
    #[error("Asset '{asset}' not found in latest release of {repository}")]
    AssetNotFound { repository: String, asset: String },

    /// An archive could not be recognized or extracted.
    #[error("Archive error: {0}")]
    Archive(String),

    /// Unpacking succeeded but the expected binary is missing.
    #[error("{tool} not found at {} after provisioning", path.display())]
    ToolNotFoundAfterProvisioning { tool: String, path: PathBuf },

    /// The orchestrator was invoked past the final step.
    #[error("Invalid step {step} (final step is {final_step})")]
    InvalidStep { step: u32, final_step: u32 },

    /// A tool expected on the system is not available.
    #[error("Tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// An external tool exited unsuccessfully.
    #[error("Tool error [{tool}]: {message}")]
    ToolFailed { tool: String, message: String },

    /// Probe output could not be interpreted.
    #[error("Probe error: {0}")]
    Probe(String),

    /// Configuration is invalid.
    #[error("Config error: {0}")]
    Config(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a new Network error.
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a new AssetNotFound error.
    pub fn asset_not_found(repository: impl Into<String>, asset: impl Into<String>) -> Self {
        Self::AssetNotFound {
            repository: repository.into(),
            asset: asset.into(),
        }
    }

    /// Create a new Archive error.
    pub fn archive<S: Into<String>>(msg: S) -> Self {
        Self::Archive(msg.into())
    }

    /// Create a new ToolNotFound error.
    pub fn tool_not_found<S: Into<String>>(tool: S) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a new ToolFailed error.
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a new Probe error.
    pub fn probe<S: Into<String>>(msg: S) -> Self {
        Self::Probe(msg.into())
    }

    /// Create a new Config error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Whether retrying the same call later may succeed.
    ///
    /// Only network failures qualify; the binary cache is untouched by them.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnsupportedPlatform {
            os: "freebsd".into(),
        };
        assert_eq!(err.to_string(), "Unsupported platform: freebsd");

        let err = Error::network("https://api.github.com", "HTTP 503");
        assert_eq!(
            err.to_string(),
            "Network error [https://api.github.com]: HTTP 503"
        );

        let err = Error::asset_not_found("quietvoid/dovi_tool", "dovi_tool-x.zip");
        assert_eq!(
            err.to_string(),
            "Asset 'dovi_tool-x.zip' not found in latest release of quietvoid/dovi_tool"
        );

        let err = Error::InvalidStep {
            step: 5,
            final_step: 4,
        };
        assert_eq!(err.to_string(), "Invalid step 5 (final step is 4)");

        let err = Error::tool_failed("ffmpeg", "exit code 1");
        assert_eq!(err.to_string(), "Tool error [ffmpeg]: exit code 1");
    }

    #[test]
    fn test_not_found_after_provisioning_display() {
        let err = Error::ToolNotFoundAfterProvisioning {
            tool: "dovi_tool".into(),
            path: PathBuf::from("/cache/bin/linux/dovi_tool"),
        };
        assert_eq!(
            err.to_string(),
            "dovi_tool not found at /cache/bin/linux/dovi_tool after provisioning"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_only_network_is_transient() {
        assert!(Error::network("u", "m").is_transient());
        assert!(!Error::archive("bad zip").is_transient());
        assert!(!Error::asset_not_found("r", "a").is_transient());
        assert!(!Error::InvalidStep {
            step: 5,
            final_step: 4
        }
        .is_transient());
    }
}
