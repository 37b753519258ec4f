//! `stvd create` — Register a build container.

use std::path::PathBuf;

use clap::Args;
use stevedore_builder::container::{BuildContainer, RootfsSpec};

use super::Settings;

/// Arguments for the `create` command.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Name of the build container.
    pub name: String,

    /// Existing directory used as the container root.
    #[arg(long, conflicts_with_all = ["lower", "upper", "overlay_work", "merged"])]
    pub rootfs: Option<PathBuf>,

    /// Read-only overlay layer, bottom first (repeatable).
    #[arg(long, requires_all = ["upper", "overlay_work", "merged"])]
    pub lower: Vec<PathBuf>,

    /// Writable overlay upper directory.
    #[arg(long, requires = "lower")]
    pub upper: Option<PathBuf>,

    /// `OverlayFS` work directory.
    #[arg(long, requires = "lower")]
    pub overlay_work: Option<PathBuf>,

    /// Mount point of the merged overlay.
    #[arg(long, requires = "lower")]
    pub merged: Option<PathBuf>,

    /// Working directory inside the container for relative destinations.
    #[arg(long, default_value = "/")]
    pub workdir: String,
}

impl CreateArgs {
    fn rootfs_spec(self) -> anyhow::Result<(String, String, RootfsSpec)> {
        let spec = match (self.rootfs, self.upper, self.overlay_work, self.merged) {
            (Some(path), ..) => RootfsSpec::Directory { path },
            (None, Some(upper_dir), Some(work_dir), Some(merged_dir)) if !self.lower.is_empty() => {
                RootfsSpec::Overlay {
                    lower_dirs: self.lower,
                    upper_dir,
                    work_dir,
                    merged_dir,
                }
            }
            _ => anyhow::bail!(
                "either --rootfs or --lower/--upper/--overlay-work/--merged is required"
            ),
        };
        Ok((self.name, self.workdir, spec))
    }
}

/// Executes the `create` command.
///
/// # Errors
///
/// Returns an error if the arguments describe no root or the catalog
/// rejects the container.
pub fn execute(settings: &Settings, args: CreateArgs) -> anyhow::Result<()> {
    let (name, workdir, spec) = args.rootfs_spec()?;
    let container = BuildContainer::new(name, spec).with_work_dir(workdir);
    let id = container.id.clone();
    settings.catalog()?.register(container)?;
    tracing::info!(id = %id, "build container created");
    println!("{id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::commands::{Cli, Command};

    fn parse(args: &[&str]) -> CreateArgs {
        let cli = Cli::try_parse_from(args).expect("parse");
        match cli.command {
            Command::Create(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rootfs_directory_spec() {
        let (name, workdir, spec) = parse(&["stvd", "create", "web", "--rootfs", "/srv/root"])
            .rootfs_spec()
            .expect("spec");
        assert_eq!(name, "web");
        assert_eq!(workdir, "/");
        assert_eq!(
            spec,
            RootfsSpec::Directory {
                path: "/srv/root".into()
            }
        );
    }

    #[test]
    fn overlay_spec_keeps_layer_order() {
        let (_, workdir, spec) = parse(&[
            "stvd", "create", "app", "--lower", "/l/base", "--lower", "/l/app", "--upper",
            "/o/up", "--overlay-work", "/o/work", "--merged", "/o/merged", "--workdir", "/app",
        ])
        .rootfs_spec()
        .expect("spec");
        assert_eq!(workdir, "/app");
        let expected = [PathBuf::from("/l/base"), PathBuf::from("/l/app")];
        assert!(matches!(
            spec,
            RootfsSpec::Overlay { ref lower_dirs, .. } if lower_dirs == &expected
        ));
    }

    #[test]
    fn missing_root_is_rejected() {
        assert!(parse(&["stvd", "create", "bare"]).rootfs_spec().is_err());
    }
}
