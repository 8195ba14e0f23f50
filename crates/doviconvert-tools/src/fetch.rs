//! Streaming asset download and in-place unpacking.
//!
//! The body goes chunk by chunk into a hidden temp file inside the
//! destination directory. Nothing is unpacked until the transfer completed,
//! and a failed transfer drops the temp file. Extraction lands in a staging
//! directory first and is renamed into place entry by entry.

use std::fs::File;
use std::path::{Path, PathBuf};

use doviconvert_common::{Error, Result};
use flate2::read::GzDecoder;
use futures::StreamExt;
use reqwest::Client;
use tar::Archive;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::http::authorize;
use crate::release::ReleaseAsset;

/// Archive formats found on the release feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

impl ArchiveKind {
    /// Infer the format from an asset file name.
    pub fn from_name(name: &str) -> Result<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".zip") {
            Ok(Self::Zip)
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Ok(Self::TarGz)
        } else {
            Err(Error::archive(format!("unrecognized archive format: {name}")))
        }
    }
}

/// Downloads release assets and unpacks them.
#[derive(Debug, Clone)]
pub struct ArchiveFetcher {
    client: Client,
}

impl ArchiveFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Download `asset` into `destination_dir` and unpack it there.
    ///
    /// # Errors
    ///
    /// - [`Error::Network`] on transport failure or a non-success status.
    /// - [`Error::Archive`] on an unknown format or a failed extraction.
    pub async fn fetch_and_unpack(&self, asset: &ReleaseAsset, destination_dir: &Path) -> Result<()> {
        let kind = ArchiveKind::from_name(&asset.name)?;
        tokio::fs::create_dir_all(destination_dir).await?;

        let download = self.download(asset, destination_dir).await?;

        let archive_path = download.path().to_path_buf();
        let dest = destination_dir.to_path_buf();
        let unpacked = tokio::task::spawn_blocking(move || unpack(kind, &archive_path, &dest))
            .await
            .map_err(|e| Error::archive(format!("extraction task failed: {e}")))?;

        // Removes the archive regardless of the extraction outcome.
        drop(download);
        let entries = unpacked?;

        info!(
            asset = %asset.name,
            dest = %destination_dir.display(),
            entries = entries.len(),
            "unpacked release asset"
        );
        Ok(())
    }

    async fn download(
        &self,
        asset: &ReleaseAsset,
        destination_dir: &Path,
    ) -> Result<tempfile::NamedTempFile> {
        let url = asset.download_url.as_str();
        debug!(%url, "downloading release asset");

        let response = authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| Error::network(url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::network(url, format!("HTTP {}", response.status())));
        }

        let total = response.content_length();
        let staging = tempfile::Builder::new()
            .prefix(".download-")
            .tempfile_in(destination_dir)?;
        let mut file = tokio::fs::File::from_std(staging.as_file().try_clone()?);

        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::network(url, e.to_string()))?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;

        if let Some(total) = total {
            if downloaded != total {
                return Err(Error::network(
                    url,
                    format!("truncated transfer: {downloaded} of {total} bytes"),
                ));
            }
        }

        debug!(%url, bytes = downloaded, "download complete");
        Ok(staging)
    }
}

/// Extract `archive` into `dest`, returning the top-level entries placed.
fn unpack(kind: ArchiveKind, archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let staging = tempfile::Builder::new().prefix(".unpack-").tempdir_in(dest)?;
    let file = File::open(archive)?;

    match kind {
        ArchiveKind::Zip => {
            let mut zip = zip::ZipArchive::new(file)
                .map_err(|e| Error::archive(format!("failed to open zip: {e}")))?;
            zip.extract(staging.path())
                .map_err(|e| Error::archive(format!("failed to extract zip: {e}")))?;
        }
        ArchiveKind::TarGz => {
            Archive::new(GzDecoder::new(file))
                .unpack(staging.path())
                .map_err(|e| Error::archive(format!("failed to extract tar: {e}")))?;
        }
    }

    let mut placed = Vec::new();
    for entry in std::fs::read_dir(staging.path())? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if target.is_dir() {
            std::fs::remove_dir_all(&target)?;
        } else if target.exists() {
            std::fs::remove_file(&target)?;
        }
        std::fs::rename(entry.path(), &target)?;
        placed.push(target);
    }

    Ok(placed)
}
