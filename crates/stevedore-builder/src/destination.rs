//! Destination resolution inside a mounted root.

use std::path::{Path, PathBuf};

use stevedore_common::error::{Result, StevedoreError};
use stevedore_core::filesystem::paths::{ensure_dir, join_under_root};

/// Where ingested content goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDestination {
    /// Absolute host path inside the mounted root.
    pub path: PathBuf,
    /// Whether `path` is (or was just created as) a directory.
    pub is_dir: bool,
}

impl ResolvedDestination {
    /// Path a single item named `name` is written to.
    ///
    /// Inside the destination when it is a directory, the destination itself
    /// otherwise.
    #[must_use]
    pub fn target_for(&self, name: &std::ffi::OsStr) -> PathBuf {
        if self.is_dir {
            self.path.join(name)
        } else {
            self.path.clone()
        }
    }
}

/// Resolves a raw destination against the mounted `root`.
///
/// Absolute destinations are taken from the root; empty and relative ones
/// from `work_dir`. An empty destination, `.`, or a trailing `/` asks for a
/// directory, which is created eagerly. Nothing else is written here;
/// [`ensure_work_dir`] creates the working directory once the caller has
/// accepted the destination.
///
/// # Errors
///
/// Returns [`StevedoreError::InvalidDestination`] when the destination's
/// parent, or a directory-marked destination, exists as a non-directory.
pub fn resolve_destination(
    root: &Path,
    work_dir: &str,
    destination: &str,
) -> Result<ResolvedDestination> {
    let path = if Path::new(destination).is_absolute() {
        join_under_root(root, Path::new(destination))
    } else {
        join_under_root(root, &Path::new(work_dir).join(destination))
    };

    if let Some(parent) = path.parent().filter(|_| path != root) {
        if std::fs::metadata(parent).is_ok_and(|meta| !meta.is_dir()) {
            return Err(StevedoreError::InvalidDestination {
                path: parent.to_path_buf(),
            });
        }
    }

    if matches!(destination, "" | ".") || destination.ends_with('/') {
        if std::fs::metadata(&path).is_ok_and(|meta| !meta.is_dir()) {
            return Err(StevedoreError::InvalidDestination { path });
        }
        ensure_dir(&path)?;
    }

    let is_dir = match std::fs::metadata(&path) {
        Ok(meta) => meta.is_dir(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => return Err(StevedoreError::io(&path, e)),
    };

    tracing::debug!(destination, path = %path.display(), is_dir, "destination resolved");
    Ok(ResolvedDestination { path, is_dir })
}

/// Creates the working directory under `root` when `destination` is
/// relative to it.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_work_dir(root: &Path, work_dir: &str, destination: &str) -> Result<()> {
    if Path::new(destination).is_absolute() {
        return Ok(());
    }
    ensure_dir(&join_under_root(root, Path::new(work_dir)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> tempfile::TempDir {
        tempfile::tempdir().expect("tempdir")
    }

    #[test]
    fn relative_destination_joins_workdir_without_writing() {
        let root = root();
        let dest = resolve_destination(root.path(), "/app", "config.yaml").expect("resolve");
        assert_eq!(dest.path, root.path().join("app/config.yaml"));
        assert!(!dest.is_dir);
        assert!(!root.path().join("app").exists());

        ensure_work_dir(root.path(), "/app", "config.yaml").expect("workdir");
        assert!(root.path().join("app").is_dir());
    }

    #[test]
    fn dot_destination_is_the_workdir() {
        let root = root();
        let dest = resolve_destination(root.path(), "/build", ".").expect("resolve");
        assert_eq!(dest.path, root.path().join("build"));
        assert!(dest.is_dir);
    }

    #[test]
    fn absolute_destination_never_creates_workdir() {
        let root = root();
        ensure_work_dir(root.path(), "/app", "/etc/motd").expect("workdir");
        assert!(!root.path().join("app").exists());
    }

    #[test]
    fn empty_destination_is_the_workdir() {
        let root = root();
        let dest = resolve_destination(root.path(), "/srv/www", "").expect("resolve");
        assert_eq!(dest.path, root.path().join("srv/www"));
        assert!(dest.is_dir);
    }

    #[test]
    fn absolute_destination_ignores_workdir() {
        let root = root();
        let dest = resolve_destination(root.path(), "/app", "/etc/motd").expect("resolve");
        assert_eq!(dest.path, root.path().join("etc/motd"));
        assert!(!dest.is_dir);
        assert!(!root.path().join("app").exists());
    }

    #[test]
    fn trailing_slash_creates_directory() {
        let root = root();
        let dest = resolve_destination(root.path(), "/", "/opt/tools/").expect("resolve");
        assert_eq!(dest.path, root.path().join("opt/tools"));
        assert!(dest.is_dir);
        assert!(root.path().join("opt/tools").is_dir());
    }

    #[test]
    fn trailing_slash_over_existing_file_is_invalid() {
        let root = root();
        std::fs::write(root.path().join("data"), b"x").expect("write");
        let err = resolve_destination(root.path(), "/", "/data/").unwrap_err();
        assert!(matches!(err, StevedoreError::InvalidDestination { .. }));
    }

    #[test]
    fn existing_directory_without_slash_is_a_directory() {
        let root = root();
        std::fs::create_dir_all(root.path().join("usr/share")).expect("mkdir");
        let dest = resolve_destination(root.path(), "/", "/usr/share").expect("resolve");
        assert!(dest.is_dir);
    }

    #[test]
    fn parent_that_is_a_file_is_invalid() {
        let root = root();
        std::fs::create_dir_all(root.path().join("etc")).expect("mkdir");
        std::fs::write(root.path().join("etc/hosts"), b"127.0.0.1 localhost\n").expect("write");
        let err = resolve_destination(root.path(), "/", "/etc/hosts/extra").unwrap_err();
        assert!(matches!(
            err,
            StevedoreError::InvalidDestination { ref path } if path.ends_with("etc/hosts")
        ));
    }

    #[test]
    fn parent_escape_is_clamped_to_root() {
        let root = root();
        let dest = resolve_destination(root.path(), "/app", "../../../outside").expect("resolve");
        assert_eq!(dest.path, root.path().join("outside"));
    }

    #[test]
    fn target_for_depends_on_directory_flag() {
        let dir = ResolvedDestination {
            path: PathBuf::from("/r/opt"),
            is_dir: true,
        };
        let file = ResolvedDestination {
            path: PathBuf::from("/r/opt/tool"),
            is_dir: false,
        };
        let name = std::ffi::OsStr::new("tool.bin");
        assert_eq!(dir.target_for(name), PathBuf::from("/r/opt/tool.bin"));
        assert_eq!(file.target_for(name), PathBuf::from("/r/opt/tool"));
    }
}
