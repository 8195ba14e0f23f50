//! Latest-release lookup and platform asset selection.

use doviconvert_common::{Error, Os, PlatformId, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::http::{authorize, DEFAULT_RELEASE_API};

/// Release metadata returned by `/repos/{repository}/releases/latest`.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// One asset entry of a release.
#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
}

/// The asset chosen for this platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAsset {
    pub name: String,
    pub download_url: String,
}

/// Asset-name suffix published for each OS.
pub fn asset_suffix(os: Os) -> &'static str {
    match os {
        Os::Windows => "pc-windows-msvc.zip",
        Os::Linux => "unknown-linux-musl.tar.gz",
        Os::MacOs => "universal-macOS.zip",
    }
}

/// Expected asset file name: `{tool}-{tag}-{arch}-{suffix}`.
///
/// ```
/// use doviconvert_common::PlatformId;
/// use doviconvert_tools::release::expected_asset_name;
///
/// let platform = PlatformId::resolve_from("linux", "x86_64").unwrap();
/// assert_eq!(
///     expected_asset_name("dovi_tool", "v3.0.0", &platform),
///     "dovi_tool-v3.0.0-x86_64-unknown-linux-musl.tar.gz"
/// );
/// ```
pub fn expected_asset_name(tool_name: &str, tag: &str, platform: &PlatformId) -> String {
    format!(
        "{}-{}-{}-{}",
        tool_name,
        tag,
        platform.arch.to_lowercase(),
        asset_suffix(platform.os)
    )
}

/// Pick the asset whose name equals the expected name exactly.
pub fn select_asset(
    release: &Release,
    repository: &str,
    tool_name: &str,
    platform: &PlatformId,
) -> Result<ReleaseAsset> {
    let expected = expected_asset_name(tool_name, &release.tag_name, platform);

    release
        .assets
        .iter()
        .find(|a| a.name == expected)
        .map(|a| ReleaseAsset {
            name: a.name.clone(),
            download_url: a.browser_download_url.clone(),
        })
        .ok_or_else(|| {
            let available: Vec<&str> = release.assets.iter().map(|a| a.name.as_str()).collect();
            debug!(%expected, ?available, "no matching release asset");
            Error::asset_not_found(repository, expected)
        })
}

/// Client for the remote release feed.
#[derive(Debug, Clone)]
pub struct ReleaseResolver {
    client: Client,
    api_base: String,
}

impl ReleaseResolver {
    pub fn new(client: Client) -> Self {
        Self::with_api_base(client, DEFAULT_RELEASE_API)
    }

    /// Point the resolver at a different feed (mirrors, tests).
    pub fn with_api_base(client: Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the most recent published release of `repository`.
    pub async fn latest_release(&self, repository: &str) -> Result<Release> {
        let url = format!("{}/repos/{}/releases/latest", self.api_base, repository);
        debug!(%url, "fetching latest release");

        let response = authorize(self.client.get(&url))
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| Error::network(&url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::network(
                &url,
                format!("HTTP {}", response.status()),
            ));
        }

        response
            .json::<Release>()
            .await
            .map_err(|e| Error::network(&url, format!("invalid release payload: {e}")))
    }

    /// Resolve the asset of the latest release matching `platform`.
    pub async fn resolve_latest_asset(
        &self,
        repository: &str,
        tool_name: &str,
        platform: &PlatformId,
    ) -> Result<ReleaseAsset> {
        let release = self.latest_release(repository).await?;
        let asset = select_asset(&release, repository, tool_name, platform)?;
        info!(
            %repository,
            tag = %release.tag_name,
            asset = %asset.name,
            "resolved release asset"
        );
        Ok(asset)
    }
}
