//! Build container records.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use stevedore_common::types::ContainerId;
use stevedore_core::filesystem::mount::{DirectoryRootfs, RootfsMount};
use stevedore_core::filesystem::overlayfs::{OverlayConfig, OverlayRootfs};

/// Where a build container's root filesystem lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RootfsSpec {
    /// A plain host directory.
    Directory {
        /// Root directory.
        path: PathBuf,
    },
    /// Image layers stacked under a writable upper directory.
    Overlay {
        /// Read-only lower layers (bottom to top).
        lower_dirs: Vec<PathBuf>,
        /// Writable upper layer.
        upper_dir: PathBuf,
        /// `OverlayFS` work directory.
        work_dir: PathBuf,
        /// Mount point of the merged view.
        merged_dir: PathBuf,
    },
}

impl RootfsSpec {
    /// Returns an unmounted provider for this root.
    #[must_use]
    pub fn mount_provider(&self) -> Box<dyn RootfsMount> {
        match self {
            Self::Directory { path } => Box::new(DirectoryRootfs::new(path.clone())),
            Self::Overlay {
                lower_dirs,
                upper_dir,
                work_dir,
                merged_dir,
            } => Box::new(OverlayRootfs::new(OverlayConfig {
                lower_dirs: lower_dirs.clone(),
                upper_dir: upper_dir.clone(),
                work_dir: work_dir.clone(),
                merged_dir: merged_dir.clone(),
            })),
        }
    }
}

/// A container image being built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildContainer {
    /// Unique identifier.
    pub id: ContainerId,
    /// Human-readable name.
    pub name: String,
    /// Working directory inside the container, used for relative destinations.
    pub work_dir: String,
    /// Root filesystem location.
    pub rootfs: RootfsSpec,
    /// ISO-8601 creation timestamp.
    pub created_at: String,
}

impl BuildContainer {
    /// Creates a record with a fresh id and `/` as working directory.
    #[must_use]
    pub fn new(name: impl Into<String>, rootfs: RootfsSpec) -> Self {
        Self {
            id: ContainerId::generate(),
            name: name.into(),
            work_dir: "/".into(),
            rootfs,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Sets the working directory.
    #[must_use]
    pub fn with_work_dir(mut self, work_dir: impl Into<String>) -> Self {
        self.work_dir = work_dir.into();
        self
    }
}
