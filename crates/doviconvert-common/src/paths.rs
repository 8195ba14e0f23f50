//! Path utilities for video-file detection and intermediate naming.
//!
//! Intermediates are always derived from a previous path by replacing its
//! extension, so re-deriving a path from the same inputs is idempotent.

use std::path::{Path, PathBuf};

/// List of supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "ts", "webm", "mov", "wmv", "flv",
];

/// Check if a path has a video file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use doviconvert_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("movie.mkv")));
/// assert!(is_video_file(Path::new("/path/to/video.mp4")));
/// assert!(!is_video_file(Path::new("subtitle.srt")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Get the list of video file extensions.
#[must_use]
pub fn video_extensions() -> &'static [&'static str] {
    VIDEO_EXTENSIONS
}

/// Replace the extension of `path` with `ext`.
///
/// Only the last extension is replaced; a path without one gains `ext`.
///
/// ```
/// use std::path::Path;
/// use doviconvert_common::paths::substitute_extension;
///
/// assert_eq!(
///     substitute_extension(Path::new("/tmp/movie.1080p.mkv"), "hevc"),
///     Path::new("/tmp/movie.1080p.hevc")
/// );
/// ```
pub fn substitute_extension(path: &Path, ext: &str) -> PathBuf {
    path.with_extension(ext)
}

/// Lossy string form of a path, as handed to external command lines.
pub fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
