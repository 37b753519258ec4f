//! Build containers and content ingestion for Stevedore.
//!
//! [`Ingester`](ingest::Ingester) is the entry point: it mounts a build
//! container's root, resolves the destination and ownership once, and
//! walks the sources in order.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod catalog;
pub mod container;
pub mod destination;
pub mod ingest;
