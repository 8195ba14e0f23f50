//! # doviconvert-tools
//!
//! Discovery and provisioning of the external binaries the Dolby Vision
//! conversion pipeline invokes.
//!
//! - **Tool catalog** ([`ToolCatalog`], [`ToolSpec`]) -- ffmpeg, dovi_tool and
//!   mp4box with their platform executable names and sources.
//! - **Release feed** ([`ReleaseResolver`]) -- latest-release lookup and
//!   platform asset matching.
//! - **Archive fetching** ([`ArchiveFetcher`]) -- streamed download and zip /
//!   tar.gz unpacking.
//! - **Provisioning** ([`ToolProvisioner`]) -- idempotent `ensure` on top of a
//!   per-OS [`BinaryCache`].
//!
//! ## Example
//!
//! ```no_run
//! use doviconvert_common::PlatformId;
//! use doviconvert_tools::{ToolCatalog, ToolProvisioner};
//!
//! # async fn example() -> doviconvert_common::Result<()> {
//! let platform = PlatformId::resolve()?;
//! let catalog = ToolCatalog::new(platform.os);
//! let provisioner = ToolProvisioner::new("/var/lib/doviconvert")?;
//! let dovi_tool = provisioner.ensure(&catalog.dovi_tool).await?;
//! println!("dovi_tool ready at {}", dovi_tool.display());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod check;
pub mod fetch;
pub mod http;
pub mod provisioner;
pub mod release;
pub mod spec;

// ---- Re-exports for convenience ----

pub use cache::BinaryCache;
pub use check::{check_tool, ToolInfo};
pub use fetch::{ArchiveFetcher, ArchiveKind};
pub use http::DEFAULT_RELEASE_API;
pub use provisioner::{InstalledTools, ToolLocator, ToolProvisioner};
pub use release::{ReleaseAsset, ReleaseResolver};
pub use spec::{ToolCatalog, ToolPaths, ToolSource, ToolSpec, DEFAULT_DOVI_TOOL_REPOSITORY};
