//! `stvd rm` — Forget a build container.

use clap::Args;

use super::Settings;

/// Arguments for the `rm` command.
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Name or id of the build container.
    pub container: String,
}

/// Executes the `rm` command.
///
/// Only the catalog entry is removed; the root filesystem is left alone.
///
/// # Errors
///
/// Returns an error if the container is unknown or the catalog cannot be
/// written.
pub fn execute(settings: &Settings, args: &RmArgs) -> anyhow::Result<()> {
    settings.catalog()?.remove(&args.container)?;
    tracing::info!(container = %args.container, "build container removed");
    Ok(())
}
