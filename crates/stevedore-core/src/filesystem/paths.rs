//! Path helpers for a mounted root.

use std::os::unix::fs::DirBuilderExt;
use std::path::{Component, Path, PathBuf};

use stevedore_common::constants::DIR_MODE;
use stevedore_common::error::{Result, StevedoreError};

/// Joins `path` under `root` lexically.
///
/// Absolute paths are taken relative to `root`, `.` is dropped, and `..`
/// never climbs above `root`.
#[must_use]
pub fn join_under_root(root: &Path, path: &Path) -> PathBuf {
    let mut rel = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => rel.push(part),
            Component::ParentDir => {
                let _ = rel.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    root.join(rel)
}

/// Creates `path` and any missing parents with mode 0755.
///
/// # Errors
///
/// Returns an error if a component cannot be created, including when an
/// existing component is not a directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(DIR_MODE)
        .create(path)
        .map_err(|e| StevedoreError::io(path, e))
}
