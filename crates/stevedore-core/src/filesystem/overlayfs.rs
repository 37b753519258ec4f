//! `OverlayFS`-backed build container roots.
//!
//! Stacks the container's read-only image layers under a writable upper
//! directory, so ingested content lands in the container's own layer.

use std::path::{Path, PathBuf};

use stevedore_common::error::{Result, StevedoreError};

use super::mount::RootfsMount;
use super::paths::ensure_dir;

/// Configuration for an `OverlayFS` mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayConfig {
    /// Read-only lower layers (bottom to top).
    pub lower_dirs: Vec<PathBuf>,
    /// Writable upper layer directory.
    pub upper_dir: PathBuf,
    /// Work directory required by `OverlayFS`.
    pub work_dir: PathBuf,
    /// Final merged mount point.
    pub merged_dir: PathBuf,
}

impl OverlayConfig {
    /// Returns the `mount(2)` data string for this configuration.
    ///
    /// `lowerdir` lists the topmost layer first, as the kernel expects.
    #[must_use]
    pub fn mount_options(&self) -> String {
        let lowers = self
            .lower_dirs
            .iter()
            .rev()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(":");
        format!(
            "lowerdir={},upperdir={},workdir={}",
            lowers,
            self.upper_dir.display(),
            self.work_dir.display()
        )
    }
}

/// Mounts an `OverlayFS` with the given configuration.
///
/// Creates the upper, work, and merged directories if they do not exist,
/// then issues the `mount(2)` syscall with overlay-specific options.
///
/// # Errors
///
/// Returns an error if directory creation fails or if the mount syscall fails.
#[cfg(target_os = "linux")]
pub fn mount_overlay(config: &OverlayConfig) -> Result<()> {
    use nix::mount::{MsFlags, mount};

    if config.lower_dirs.is_empty() {
        return Err(StevedoreError::Mount {
            target: config.merged_dir.display().to_string(),
            message: "overlay needs at least one lower layer".into(),
        });
    }
    ensure_dir(&config.upper_dir)?;
    ensure_dir(&config.work_dir)?;
    ensure_dir(&config.merged_dir)?;

    let opts = config.mount_options();
    mount(
        Some("overlay"),
        &config.merged_dir,
        Some("overlay"),
        MsFlags::empty(),
        Some(opts.as_str()),
    )
    .map_err(|e| StevedoreError::Mount {
        target: config.merged_dir.display().to_string(),
        message: format!("overlay mount failed: {e}"),
    })?;

    tracing::info!(merged = %config.merged_dir.display(), "overlayfs mounted");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — `OverlayFS` mounting requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn mount_overlay(config: &OverlayConfig) -> Result<()> {
    Err(StevedoreError::Mount {
        target: config.merged_dir.display().to_string(),
        message: "Linux required for overlay roots".into(),
    })
}

/// Unmounts an `OverlayFS` at the given path.
///
/// Uses `MNT_DETACH` to lazily detach the filesystem.
///
/// # Errors
///
/// Returns an error if the unmount syscall fails.
#[cfg(target_os = "linux")]
pub fn unmount_overlay(merged_dir: &Path) -> Result<()> {
    nix::mount::umount2(merged_dir, nix::mount::MntFlags::MNT_DETACH).map_err(|e| {
        StevedoreError::Mount {
            target: merged_dir.display().to_string(),
            message: format!("unmount overlay failed: {e}"),
        }
    })?;
    tracing::info!(path = %merged_dir.display(), "overlayfs unmounted");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — `OverlayFS` unmounting requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn unmount_overlay(merged_dir: &Path) -> Result<()> {
    Err(StevedoreError::Mount {
        target: merged_dir.display().to_string(),
        message: "Linux required for overlay roots".into(),
    })
}

/// A build container root assembled from overlay layers.
#[derive(Debug, Clone)]
pub struct OverlayRootfs {
    config: OverlayConfig,
    mounted: bool,
}

impl OverlayRootfs {
    /// Creates an unmounted overlay root.
    #[must_use]
    pub const fn new(config: OverlayConfig) -> Self {
        Self {
            config,
            mounted: false,
        }
    }
}

impl RootfsMount for OverlayRootfs {
    fn mount(&mut self) -> Result<PathBuf> {
        if !self.mounted {
            mount_overlay(&self.config)?;
            self.mounted = true;
        }
        Ok(self.config.merged_dir.clone())
    }

    fn unmount(&mut self) -> Result<()> {
        if self.mounted {
            unmount_overlay(&self.config.merged_dir)?;
            self.mounted = false;
        }
        Ok(())
    }
}
