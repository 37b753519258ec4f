//! # stevedore-core
//!
//! Low-level Unix primitives used while ingesting content into a build
//! container's root filesystem.
//!
//! This crate provides:
//! - **Filesystem**: the scoped mount bracket, `OverlayFS` mounting, and
//!   root-confined path joining.
//! - **Identity**: uid/gid lookup in a mounted root's `passwd`/`group` files.
//! - **Ownership**: applying a resolved owner to a path or a whole tree.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod filesystem;
pub mod identity;
pub mod ownership;
