//! CLI command definitions and dispatch.

pub mod add;
pub mod containers;
pub mod create;
pub mod rm;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use stevedore_builder::catalog::ContainerCatalog;
use stevedore_common::config::StevedoreConfig;

/// Stevedore — add content to build containers.
#[derive(Parser, Debug)]
#[command(name = stevedore_common::constants::BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Enable offline mode (refuse remote URL sources).
    #[arg(long, global = true)]
    pub offline: bool,

    /// Path to the configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a build container.
    Create(create::CreateArgs),
    /// List registered build containers.
    Containers(containers::ContainersArgs),
    /// Add files, directories, URLs or extracted archives to a container.
    Add(add::AddArgs),
    /// Copy files, directories or URLs to a container, never extracting.
    Copy(add::AddArgs),
    /// Forget a build container.
    Rm(rm::RmArgs),
}

/// Settings shared by every command.
#[derive(Debug)]
pub struct Settings {
    /// Effective configuration.
    pub config: StevedoreConfig,
}

impl Settings {
    /// Loads the configuration and applies global flags.
    fn load(cli: &Cli) -> anyhow::Result<Self> {
        let path = cli
            .config
            .clone()
            .unwrap_or_else(stevedore_common::constants::default_config_file);
        let mut config = StevedoreConfig::load_or_default(&path)
            .with_context(|| format!("loading configuration from {}", path.display()))?;
        config.offline |= cli.offline;
        Ok(Self { config })
    }

    /// Opens the build-container catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog directory cannot be created.
    pub fn catalog(&self) -> anyhow::Result<ContainerCatalog> {
        ContainerCatalog::open(&self.config.catalog_file).with_context(|| {
            format!(
                "opening catalog {}",
                self.config.catalog_file.display()
            )
        })
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(&cli)?;
    match cli.command {
        Command::Create(args) => create::execute(&settings, args),
        Command::Containers(args) => containers::execute(&settings, &args),
        Command::Add(args) => add::execute(&settings, args, true),
        Command::Copy(args) => add::execute(&settings, args, false),
        Command::Rm(args) => rm::execute(&settings, &args),
    }
}
