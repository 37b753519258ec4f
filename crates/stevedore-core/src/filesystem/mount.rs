//! Scoped acquisition of a build container's root filesystem.
//!
//! An ingestion mounts the container's root once, works inside it, and
//! releases it on every exit path. [`MountGuard`] owns that release.

use std::path::{Path, PathBuf};

use stevedore_common::error::{Result, StevedoreError};

/// A build container root that can be made available at a host path.
pub trait RootfsMount {
    /// Makes the root available and returns its absolute host path.
    ///
    /// # Errors
    ///
    /// Returns [`StevedoreError::Mount`] if the root cannot be mounted.
    fn mount(&mut self) -> Result<PathBuf>;

    /// Releases a previous [`RootfsMount::mount`].
    ///
    /// # Errors
    ///
    /// Returns an error if the release fails.
    fn unmount(&mut self) -> Result<()>;
}

/// Holds a mounted root and unmounts it when dropped.
pub struct MountGuard<'a, M: RootfsMount + ?Sized> {
    mount: &'a mut M,
    root: PathBuf,
}

impl<'a, M: RootfsMount + ?Sized> MountGuard<'a, M> {
    /// Mounts `mount` and returns a guard for it.
    ///
    /// # Errors
    ///
    /// Returns the mount error unchanged; nothing needs releasing then.
    pub fn acquire(mount: &'a mut M) -> Result<Self> {
        let root = mount.mount()?;
        tracing::debug!(root = %root.display(), "rootfs mounted");
        Ok(Self { mount, root })
    }

    /// Returns the mounted root path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl<M: RootfsMount + ?Sized> Drop for MountGuard<'_, M> {
    fn drop(&mut self) {
        if let Err(e) = self.mount.unmount() {
            tracing::error!(root = %self.root.display(), error = %e, "error unmounting container");
        } else {
            tracing::debug!(root = %self.root.display(), "rootfs unmounted");
        }
    }
}

impl<M: RootfsMount + ?Sized> std::fmt::Debug for MountGuard<'_, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountGuard").field("root", &self.root).finish()
    }
}

/// A root that already exists as a plain host directory.
#[derive(Debug, Clone)]
pub struct DirectoryRootfs {
    path: PathBuf,
}

impl DirectoryRootfs {
    /// Wraps an existing directory.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RootfsMount for DirectoryRootfs {
    fn mount(&mut self) -> Result<PathBuf> {
        if !self.path.is_dir() {
            return Err(StevedoreError::Mount {
                target: self.path.display().to_string(),
                message: "root directory does not exist".into(),
            });
        }
        std::fs::canonicalize(&self.path).map_err(|e| StevedoreError::Mount {
            target: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn unmount(&mut self) -> Result<()> {
        Ok(())
    }
}
