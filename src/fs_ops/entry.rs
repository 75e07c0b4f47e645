use std::path::{Path, PathBuf};

/// One file or directory discovered in a source tree or archive.
///
/// Entries are produced during traversal and consumed exactly once
/// (moved, extracted or skipped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub relative_path: PathBuf,
    pub is_directory: bool,
}

impl FileEntry {
    pub fn file(relative_path: impl Into<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into(),
            is_directory: false,
        }
    }

    pub fn directory(relative_path: impl Into<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into(),
            is_directory: true,
        }
    }

    /// Number of path components (1 = directly under the root).
    pub fn depth(&self) -> usize {
        self.relative_path.components().count()
    }

    pub fn path(&self) -> &Path {
        &self.relative_path
    }
}
