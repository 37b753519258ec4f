//! `stvd add` / `stvd copy` — Ingest content into a build container.

use anyhow::Context;
use clap::Args;
use stevedore_builder::ingest::Ingester;
use stevedore_common::types::IngestionOptions;

use super::Settings;
use crate::output;

/// Arguments shared by the `add` and `copy` commands.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Name or id of the build container.
    pub container: String,

    /// Sources followed by the destination; a lone source goes to the
    /// working directory.
    #[arg(required = true, num_args = 1.., value_name = "SRC... [DEST]")]
    pub args: Vec<String>,

    /// Owner of the ingested content, as `USER[:GROUP]`.
    #[arg(long, value_name = "USER[:GROUP]")]
    pub chown: Option<String>,
}

/// Splits positional arguments into sources and destination.
///
/// With more than one argument the last is the destination; a single
/// argument is a source copied to the working directory.
fn split_destination(mut args: Vec<String>) -> (Vec<String>, String) {
    if args.len() > 1 {
        let dest = args.pop().unwrap_or_default();
        (args, dest)
    } else {
        (args, String::new())
    }
}

/// Executes `add` (with `extract_archives`) or `copy`.
///
/// # Errors
///
/// Returns an error if the container is unknown or ingestion fails.
pub fn execute(settings: &Settings, args: AddArgs, extract_archives: bool) -> anyhow::Result<()> {
    let container = settings.catalog()?.find(&args.container)?;
    let options = args
        .chown
        .as_deref()
        .map(IngestionOptions::from_chown)
        .unwrap_or_default();
    let (sources, destination) = split_destination(args.args);

    let mut ingester = Ingester::for_container(&container, &settings.config)?;
    let report = ingester
        .ingest(&destination, extract_archives, &options, &sources)
        .with_context(|| format!("error adding content to {}", container.name))?;

    for item in &report {
        println!("{}", output::ingested_line(item));
    }
    Ok(())
}
