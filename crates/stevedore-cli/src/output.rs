//! Formatted output helpers for CLI commands.

use stevedore_builder::container::{BuildContainer, RootfsSpec};
use stevedore_builder::ingest::Ingested;

/// Column header for [`container_row`].
#[must_use]
pub fn container_header() -> String {
    format!(
        "{:<38} {:<16} {:<10} {:<12} {}",
        "CONTAINER ID", "NAME", "ROOTFS", "WORKDIR", "CREATED"
    )
}

/// One table row describing a build container.
#[must_use]
pub fn container_row(c: &BuildContainer) -> String {
    let kind = match c.rootfs {
        RootfsSpec::Directory { .. } => "directory",
        RootfsSpec::Overlay { .. } => "overlay",
    };
    format!(
        "{:<38} {:<16} {:<10} {:<12} {}",
        c.id.as_str(), c.name, kind, c.work_dir, c.created_at
    )
}

/// One line summarising an ingested item.
#[must_use]
pub fn ingested_line(item: &Ingested) -> String {
    let owner = if item.owner_applied { " (chowned)" } else { "" };
    format!(
        "{:<9} {} -> {}{owner}",
        item.kind.to_string(),
        item.source,
        item.target.display()
    )
}
