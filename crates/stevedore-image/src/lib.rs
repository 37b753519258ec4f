//! # stevedore-image
//!
//! Content plumbing for ingesting sources into a build container.
//!
//! Handles:
//! - **Sources**: URL vs. glob classification, glob expansion, and the
//!   per-kind ownership policy.
//! - **Transfer**: the [`ContentTransfer`](transfer::ContentTransfer)
//!   capability and its tar-backed implementation.
//! - **Archives**: content sniffing and extraction of tar and gzip'd tar.
//! - **Fetch**: downloading `http://` and `https://` sources.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod archive;
pub mod fetch;
pub mod source;
pub mod transfer;
