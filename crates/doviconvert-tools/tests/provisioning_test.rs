//! Provisioning tests against a mocked release feed.

use std::path::Path;

use assert_matches::assert_matches;
use doviconvert_common::{Error, Os, PlatformId};
use doviconvert_tools::{ArchiveFetcher, ReleaseAsset, ReleaseResolver, ToolProvisioner, ToolSpec};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REPO: &str = "quietvoid/dovi_tool";
const LINUX_ASSET: &str = "dovi_tool-v3.0.0-x86_64-unknown-linux-musl.tar.gz";

fn linux() -> PlatformId {
    PlatformId::resolve_from("linux", "x86_64").unwrap()
}

fn tar_gz(files: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, data) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

fn release_body(server: &MockServer, names: &[&str]) -> serde_json::Value {
    let assets: Vec<_> = names
        .iter()
        .map(|n| {
            json!({
                "name": n,
                "browser_download_url": format!("{}/download/{}", server.uri(), n),
            })
        })
        .collect();
    json!({ "tag_name": "v3.0.0", "assets": assets })
}

async fn mount_release(server: &MockServer, names: &[&str], expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{REPO}/releases/latest")))
        .respond_with(ResponseTemplate::new(200).set_body_json(release_body(server, names)))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_download(server: &MockServer, name: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(format!("/download/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

fn provisioner(root: &Path, server: &MockServer) -> ToolProvisioner {
    ToolProvisioner::new(root)
        .unwrap()
        .with_release_api(&server.uri())
        .unwrap()
        .with_platform(linux())
}

fn files_under(dir: &Path) -> Vec<std::path::PathBuf> {
    if !dir.exists() {
        return Vec::new();
    }
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir).unwrap() {
        let p = entry.unwrap().path();
        if p.is_dir() {
            out.extend(files_under(&p));
        } else {
            out.push(p);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Release resolution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resolves_platform_asset_from_latest_release() {
    let server = MockServer::start().await;
    mount_release(
        &server,
        &[
            "dovi_tool-v3.0.0-x86_64-pc-windows-msvc.zip",
            LINUX_ASSET,
            "dovi_tool-v3.0.0-universal-macOS.zip",
        ],
        1,
    )
    .await;

    let resolver = ReleaseResolver::with_api_base(reqwest::Client::new(), server.uri());
    let asset = resolver
        .resolve_latest_asset(REPO, "dovi_tool", &linux())
        .await
        .unwrap();

    assert_eq!(asset.name, LINUX_ASSET);
    assert_eq!(
        asset.download_url,
        format!("{}/download/{}", server.uri(), LINUX_ASSET)
    );
}

#[tokio::test]
async fn feed_error_status_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let resolver = ReleaseResolver::with_api_base(reqwest::Client::new(), server.uri());
    let err = resolver
        .resolve_latest_asset(REPO, "dovi_tool", &linux())
        .await
        .unwrap_err();

    assert_matches!(err, Error::Network { .. });
    assert!(err.is_transient());
}

#[tokio::test]
async fn empty_asset_list_is_asset_not_found_and_creates_nothing() {
    let server = MockServer::start().await;
    mount_release(&server, &[], 1).await;

    let root = tempfile::tempdir().unwrap();
    let provisioner = provisioner(root.path(), &server);
    let tool = ToolSpec::dovi_tool(Os::Linux, REPO);

    let err = provisioner.ensure(&tool).await.unwrap_err();
    assert_matches!(err, Error::AssetNotFound { ref asset, .. } if asset == LINUX_ASSET);
    assert!(files_under(root.path()).is_empty());
}

// ---------------------------------------------------------------------------
// Provisioning
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ensure_downloads_once_then_uses_cache() {
    let server = MockServer::start().await;
    mount_release(&server, &[LINUX_ASSET], 1).await;
    mount_download(&server, LINUX_ASSET, tar_gz(&[("dovi_tool", b"#!/bin/sh\n")])).await;

    let root = tempfile::tempdir().unwrap();
    let provisioner = provisioner(root.path(), &server);
    let tool = ToolSpec::dovi_tool(Os::Linux, REPO);

    let first = provisioner.ensure(&tool).await.unwrap();
    assert_eq!(first, root.path().join("bin").join("linux").join("dovi_tool"));
    assert_eq!(std::fs::read(&first).unwrap(), b"#!/bin/sh\n");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&first).unwrap().permissions().mode();
        assert_ne!(mode & 0o111, 0, "binary should be executable");
    }

    // Second call must not touch the feed (expect(1) above).
    let second = provisioner.ensure(&tool).await.unwrap();
    assert_eq!(first, second);

    // Only the binary remains; the archive and staging dirs are gone.
    assert_eq!(files_under(root.path()), vec![first]);
}

#[tokio::test]
async fn concurrent_cold_start_fetches_once() {
    let server = MockServer::start().await;
    mount_release(&server, &[LINUX_ASSET], 1).await;
    mount_download(&server, LINUX_ASSET, tar_gz(&[("dovi_tool", b"bin")])).await;

    let root = tempfile::tempdir().unwrap();
    let provisioner = provisioner(root.path(), &server);
    let tool = ToolSpec::dovi_tool(Os::Linux, REPO);

    let (a, b) = tokio::join!(provisioner.ensure(&tool), provisioner.ensure(&tool));
    assert_eq!(a.unwrap(), b.unwrap());
}

#[tokio::test]
async fn archive_without_expected_binary_is_reported() {
    let server = MockServer::start().await;
    mount_release(&server, &[LINUX_ASSET], 1).await;
    mount_download(&server, LINUX_ASSET, tar_gz(&[("README.md", b"docs")])).await;

    let root = tempfile::tempdir().unwrap();
    let provisioner = provisioner(root.path(), &server);
    let tool = ToolSpec::dovi_tool(Os::Linux, REPO);

    let err = provisioner.ensure(&tool).await.unwrap_err();
    assert_matches!(err, Error::ToolNotFoundAfterProvisioning { ref tool, .. } if tool == "dovi_tool");
}

// ---------------------------------------------------------------------------
// Archive fetching
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_download_leaves_no_partial_archive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/download/{LINUX_ASSET}")))
        .respond_with(ResponseTemplate::new(500).set_body_bytes(b"partial".to_vec()))
        .mount(&server)
        .await;

    let dest = tempfile::tempdir().unwrap();
    let fetcher = ArchiveFetcher::new(reqwest::Client::new());
    let asset = ReleaseAsset {
        name: LINUX_ASSET.to_string(),
        download_url: format!("{}/download/{}", server.uri(), LINUX_ASSET),
    };

    let err = fetcher.fetch_and_unpack(&asset, dest.path()).await.unwrap_err();
    assert_matches!(err, Error::Network { .. });
    assert!(files_under(dest.path()).is_empty());
}

#[tokio::test]
async fn unreachable_host_is_network_error() {
    let dest = tempfile::tempdir().unwrap();
    let fetcher = ArchiveFetcher::new(reqwest::Client::new());
    let asset = ReleaseAsset {
        name: LINUX_ASSET.to_string(),
        download_url: format!("http://127.0.0.1:9/{LINUX_ASSET}"),
    };

    let err = fetcher.fetch_and_unpack(&asset, dest.path()).await.unwrap_err();
    assert_matches!(err, Error::Network { .. });
    assert!(files_under(dest.path()).is_empty());
}

#[tokio::test]
async fn unknown_archive_format_is_rejected_before_download() {
    let dest = tempfile::tempdir().unwrap();
    let fetcher = ArchiveFetcher::new(reqwest::Client::new());
    let asset = ReleaseAsset {
        name: "dovi_tool-v3.0.0-x86_64-unknown-linux-musl.7z".to_string(),
        download_url: "http://127.0.0.1:9/never-fetched".to_string(),
    };

    let err = fetcher.fetch_and_unpack(&asset, dest.path()).await.unwrap_err();
    assert_matches!(err, Error::Archive(_));
}

#[tokio::test]
async fn truncated_download_leaves_no_partial_archive() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Promises 100000 bytes, sends 10, then hangs up.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\nContent-Length: 100000\r\nConnection: close\r\n\r\n0123456789",
            )
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let dest = tempfile::tempdir().unwrap();
    let fetcher = ArchiveFetcher::new(reqwest::Client::new());
    let asset = ReleaseAsset {
        name: LINUX_ASSET.to_string(),
        download_url: format!("http://{addr}/{LINUX_ASSET}"),
    };

    let err = fetcher.fetch_and_unpack(&asset, dest.path()).await.unwrap_err();
    assert_matches!(err, Error::Network { .. });
    assert!(files_under(dest.path()).is_empty());
}
