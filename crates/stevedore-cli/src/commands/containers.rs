//! `stvd containers` — List registered build containers.

use clap::Args;

use super::Settings;
use crate::output;

/// Arguments for the `containers` command.
#[derive(Args, Debug)]
pub struct ContainersArgs {
    /// Only print container ids.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Executes the `containers` command.
///
/// # Errors
///
/// Returns an error if the catalog cannot be read.
pub fn execute(settings: &Settings, args: &ContainersArgs) -> anyhow::Result<()> {
    let containers = settings.catalog()?.list()?;

    if args.quiet {
        for c in &containers {
            println!("{}", c.id);
        }
        return Ok(());
    }

    if containers.is_empty() {
        println!("No build containers found.");
        return Ok(());
    }

    println!("{}", output::container_header());
    for c in &containers {
        println!("{}", output::container_row(c));
    }
    Ok(())
}
