//! Byte-level content transfer into a mounted root.
//!
//! The orchestrator decides what to copy where; implementations of
//! [`ContentTransfer`] decide how.

use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;

use stevedore_common::error::{Result, StevedoreError};
use stevedore_core::filesystem::paths::ensure_dir;

use crate::archive;

/// Copy and extraction primitives used during ingestion.
pub trait ContentTransfer {
    /// Copies the contents of directory `src` (not `src` itself) into `dst`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading `src` or writing under `dst` fails.
    fn copy_tree(&self, src: &Path, dst: &Path) -> Result<()>;

    /// Copies file `src` to path `dst`, preserving mode and timestamps.
    ///
    /// # Errors
    ///
    /// Returns an error if the copy fails.
    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()>;

    /// Extracts archive `src` into directory `dest_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be read or unpacked.
    fn extract_archive(&self, src: &Path, dest_dir: &Path) -> Result<()>;

    /// Returns whether `path` looks like an archive worth extracting.
    fn is_archive(&self, path: &Path) -> bool;
}

/// [`ContentTransfer`] that round-trips content through a tar stream.
///
/// The stream is spooled to an anonymous temporary file rather than memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct TarTransfer;

impl TarTransfer {
    /// Creates a tar-backed transfer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Builds a tar stream into a spool file and rewinds it.
fn spool(
    src: &Path,
    fill: impl FnOnce(&mut tar::Builder<File>) -> std::io::Result<()>,
) -> Result<File> {
    let file = tempfile::tempfile().map_err(|e| StevedoreError::io(std::env::temp_dir(), e))?;
    let mut builder = tar::Builder::new(file);
    builder.mode(tar::HeaderMode::Complete);
    fill(&mut builder).map_err(|e| StevedoreError::io(src, e))?;
    let mut file = builder
        .into_inner()
        .map_err(|e| StevedoreError::io(src, e))?;
    let _ = file
        .seek(SeekFrom::Start(0))
        .map_err(|e| StevedoreError::io(src, e))?;
    Ok(file)
}

impl ContentTransfer for TarTransfer {
    fn copy_tree(&self, src: &Path, dst: &Path) -> Result<()> {
        let stream = spool(src, |builder| {
            builder.follow_symlinks(false);
            builder.append_dir_all(".", src)
        })?;
        ensure_dir(dst)?;
        archive::unpack_into(stream, dst)
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()> {
        let (Some(parent), Some(name)) = (dst.parent(), dst.file_name()) else {
            return Err(StevedoreError::InvalidDestination {
                path: dst.to_path_buf(),
            });
        };
        let stream = spool(src, |builder| builder.append_path_with_name(src, name))?;
        ensure_dir(parent)?;
        archive::unpack_into(stream, parent)
    }

    fn extract_archive(&self, src: &Path, dest_dir: &Path) -> Result<()> {
        archive::extract_archive(src, dest_dir)
    }

    fn is_archive(&self, path: &Path) -> bool {
        archive::is_archive(path)
    }
}
