mod types;

pub use types::*;

use anyhow::{Context, Result};
use doviconvert_tools::ToolProvisioner;
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./doviconvert.toml",
        "~/.config/doviconvert/config.toml",
        "/etc/doviconvert/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_repository("dovi_tool_repository", &config.tools.dovi_tool_repository)?;
    if let Some(ref repository) = config.tools.mp4box_repository {
        validate_repository("mp4box_repository", repository)?;
    }

    if config.tools.release_api.trim().is_empty() {
        anyhow::bail!("release_api cannot be empty");
    }

    for (tool, path) in config.tools.overrides() {
        if !path.exists() {
            tracing::warn!("Configured {} path does not exist: {:?}", tool, path);
        }
    }

    Ok(())
}

fn validate_repository(key: &str, repository: &str) -> Result<()> {
    let mut parts = repository.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => Ok(()),
        _ => anyhow::bail!("{} must be 'owner/name', got '{}'", key, repository),
    }
}

/// Build a provisioner from the tools section.
pub fn build_provisioner(tools: &ToolsConfig) -> Result<ToolProvisioner> {
    let mut provisioner = ToolProvisioner::new(tools.root_dir())
        .context("Failed to create HTTP client")?
        .with_release_api(&tools.release_api)
        .context("Failed to create HTTP client")?;

    for (tool, path) in tools.overrides() {
        provisioner = provisioner.with_override(tool, path);
    }

    Ok(provisioner)
}
