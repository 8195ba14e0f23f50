//! Local binary cache layout.
//!
//! `<root>/bin/<os>/<executable>`. One directory per operating system; the
//! architecture is not part of the path and no version is recorded, so a
//! present binary is never refreshed.

use std::path::{Path, PathBuf};

use doviconvert_common::Os;

use crate::spec::ToolSpec;

/// Binary cache rooted at a plugin or data directory.
#[derive(Debug, Clone)]
pub struct BinaryCache {
    root: PathBuf,
}

impl BinaryCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every cached binary for `os`.
    pub fn bin_dir(&self, os: Os) -> PathBuf {
        self.root.join("bin").join(os.as_str())
    }

    /// Canonical path of `tool` for `os`, whether or not it exists yet.
    pub fn binary_path(&self, tool: &ToolSpec, os: Os) -> PathBuf {
        self.bin_dir(os).join(&tool.executable)
    }

    /// Path of the cached binary if it is present on disk.
    pub fn lookup(&self, tool: &ToolSpec, os: Os) -> Option<PathBuf> {
        let path = self.binary_path(tool, os);
        path.is_file().then_some(path)
    }
}
