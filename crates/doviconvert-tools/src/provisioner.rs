//! Idempotent tool provisioning.
//!
//! [`ToolProvisioner::ensure`] returns immediately when the canonical cache
//! path already holds a binary. Otherwise it resolves the platform, picks the
//! matching asset from the latest release, and unpacks it into the cache.
//! Concurrent callers for the same tool are serialized by a per-tool async
//! lock, and the existence check is repeated once the lock is held.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use doviconvert_common::{Error, PlatformId, Result};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cache::BinaryCache;
use crate::fetch::ArchiveFetcher;
use crate::http::build_client;
use crate::release::ReleaseResolver;
use crate::spec::{ToolCatalog, ToolPaths, ToolSource, ToolSpec};

/// Anything that can hand out a ready-to-execute path for a tool.
#[async_trait]
pub trait ToolLocator: Send + Sync {
    async fn locate(&self, tool: &ToolSpec) -> Result<PathBuf>;

    /// Locate every tool of `catalog`.
    async fn locate_all(&self, catalog: &ToolCatalog) -> Result<ToolPaths> {
        Ok(ToolPaths {
            ffmpeg: self.locate(&catalog.ffmpeg).await?,
            dovi_tool: self.locate(&catalog.dovi_tool).await?,
            mp4box: self.locate(&catalog.mp4box).await?,
        })
    }
}

/// Ensures external binaries are present in the local cache.
pub struct ToolProvisioner {
    cache: BinaryCache,
    releases: ReleaseResolver,
    fetcher: ArchiveFetcher,
    platform: Option<PlatformId>,
    overrides: HashMap<String, PathBuf>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ToolProvisioner {
    /// Provisioner caching under `root` and querying the default release feed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let client = build_client()?;
        Ok(Self {
            cache: BinaryCache::new(root),
            releases: ReleaseResolver::new(client.clone()),
            fetcher: ArchiveFetcher::new(client),
            platform: None,
            overrides: HashMap::new(),
            locks: DashMap::new(),
        })
    }

    /// Use a different release feed base URL.
    pub fn with_release_api(mut self, api_base: &str) -> Result<Self> {
        self.releases = ReleaseResolver::with_api_base(build_client()?, api_base);
        Ok(self)
    }

    /// Pin the platform instead of detecting the running one.
    pub fn with_platform(mut self, platform: PlatformId) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Use an explicit binary for `tool_name`, bypassing cache and feed.
    pub fn with_override(mut self, tool_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.overrides.insert(tool_name.into(), path.into());
        self
    }

    pub fn cache(&self) -> &BinaryCache {
        &self.cache
    }

    fn platform(&self) -> Result<PlatformId> {
        match &self.platform {
            Some(p) => Ok(p.clone()),
            None => PlatformId::resolve(),
        }
    }

    fn lock_for(&self, tool_name: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(tool_name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn configured_override(&self, tool: &ToolSpec) -> Option<PathBuf> {
        let path = self.overrides.get(&tool.name)?;
        if path.exists() {
            Some(path.clone())
        } else {
            debug!(tool = %tool.name, path = %path.display(), "configured path missing; ignoring");
            None
        }
    }

    /// Path of `tool` if it is usable without downloading anything.
    pub fn find_installed(&self, tool: &ToolSpec) -> Result<Option<PathBuf>> {
        if let Some(path) = self.configured_override(tool) {
            return Ok(Some(path));
        }
        let platform = self.platform()?;
        if let Some(path) = self.cache.lookup(tool, platform.os) {
            return Ok(Some(path));
        }
        Ok(match tool.source {
            ToolSource::SystemPath => find_on_path(tool),
            ToolSource::GithubRelease { .. } => None,
        })
    }

    /// Return the path to a ready-to-execute binary for `tool`.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::UnsupportedPlatform`], [`Error::Network`],
    /// [`Error::AssetNotFound`], and [`Error::Archive`] unchanged. Returns
    /// [`Error::ToolNotFoundAfterProvisioning`] when the unpacked archive does
    /// not contain the expected executable, and [`Error::ToolNotFound`] for a
    /// system tool that cannot be found.
    pub async fn ensure(&self, tool: &ToolSpec) -> Result<PathBuf> {
        if let Some(path) = self.configured_override(tool) {
            return Ok(path);
        }

        let platform = self.platform()?;
        if let Some(path) = self.cache.lookup(tool, platform.os) {
            debug!(tool = %tool.name, path = %path.display(), "tool already cached");
            return Ok(path);
        }

        match &tool.source {
            ToolSource::SystemPath => {
                find_on_path(tool).ok_or_else(|| Error::tool_not_found(&tool.name))
            }
            ToolSource::GithubRelease { repository } => {
                self.provision(tool, repository, &platform).await
            }
        }
    }

    async fn provision(
        &self,
        tool: &ToolSpec,
        repository: &str,
        platform: &PlatformId,
    ) -> Result<PathBuf> {
        let lock = self.lock_for(&tool.name);
        let _guard = lock.lock().await;

        // Another task may have finished while we waited.
        if let Some(path) = self.cache.lookup(tool, platform.os) {
            return Ok(path);
        }

        info!(tool = %tool.name, %repository, %platform, "provisioning tool");

        let asset = self
            .releases
            .resolve_latest_asset(repository, &tool.name, platform)
            .await?;

        let bin_dir = self.cache.bin_dir(platform.os);
        tokio::fs::create_dir_all(&bin_dir).await?;
        self.fetcher.fetch_and_unpack(&asset, &bin_dir).await?;

        let binary = self.cache.binary_path(tool, platform.os);
        if !binary.is_file() {
            return Err(Error::ToolNotFoundAfterProvisioning {
                tool: tool.name.clone(),
                path: binary,
            });
        }
        make_executable(&binary)?;

        info!(tool = %tool.name, path = %binary.display(), "tool provisioned");
        Ok(binary)
    }
}

#[async_trait]
impl ToolLocator for ToolProvisioner {
    async fn locate(&self, tool: &ToolSpec) -> Result<PathBuf> {
        self.ensure(tool).await
    }
}

/// Locator over what is already installed. Never downloads.
///
/// A tool that is not installed resolves to its bare executable name, which
/// is enough to show the commands a run would execute.
pub struct InstalledTools(ToolProvisioner);

impl InstalledTools {
    pub fn new(provisioner: ToolProvisioner) -> Self {
        Self(provisioner)
    }

    pub fn provisioner(&self) -> &ToolProvisioner {
        &self.0
    }
}

#[async_trait]
impl ToolLocator for InstalledTools {
    async fn locate(&self, tool: &ToolSpec) -> Result<PathBuf> {
        Ok(self
            .0
            .find_installed(tool)?
            .unwrap_or_else(|| PathBuf::from(&tool.executable)))
    }
}

fn find_on_path(tool: &ToolSpec) -> Option<PathBuf> {
    tool.search_names().find_map(|name| which::which(name).ok())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o755);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
