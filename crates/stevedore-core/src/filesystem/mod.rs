//! Filesystem management for build containers.
//!
//! Provides the mount bracket around an ingestion, `OverlayFS` mounting,
//! and helpers for working with paths inside a mounted root.

pub mod mount;
pub mod overlayfs;
pub mod paths;
