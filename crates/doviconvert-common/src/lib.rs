//! Doviconvert-Common: shared error type, platform detection, and path helpers.
//!
//! - **Error Handling**: the unified [`Error`] taxonomy used by every crate
//! - **Platform**: [`PlatformId`] resolution for release-asset matching
//! - **Path Utilities**: video-file detection and extension substitution
//!
//! # Examples
//!
//! ```
//! use doviconvert_common::paths::{is_video_file, substitute_extension};
//! use doviconvert_common::platform::{Os, PlatformId};
//! use std::path::Path;
//!
//! assert!(is_video_file(Path::new("movie.mkv")));
//! assert_eq!(
//!     substitute_extension(Path::new("/cache/movie.mkv"), "hevc"),
//!     Path::new("/cache/movie.hevc")
//! );
//!
//! let platform = PlatformId::resolve_from("linux", "amd64").unwrap();
//! assert_eq!(platform.os, Os::Linux);
//! assert_eq!(platform.arch, "x86_64");
//! ```

pub mod error;
pub mod paths;
pub mod platform;

pub use error::{Error, Result};
pub use platform::{Os, PlatformId};
