//! Applying a resolved owner to ingested content.
//!
//! Symlinks are re-owned themselves and never followed, so a link inside
//! the root cannot redirect a chown onto a host path.

use std::os::unix::fs::lchown;
use std::path::Path;

use stevedore_common::error::{Result, StevedoreError};
use stevedore_common::types::Ownership;
use walkdir::WalkDir;

/// Sets the owner of `path` only.
///
/// # Errors
///
/// Returns an error if the chown fails.
pub fn chown_path(path: &Path, owner: Ownership) -> Result<()> {
    lchown(path, Some(owner.uid), Some(owner.gid)).map_err(|e| StevedoreError::io(path, e))
}

/// Sets the owner of `path` and, if it is a directory, of everything below it.
///
/// # Errors
///
/// Returns an error if any entry cannot be read or re-owned. Entries
/// visited before the failure keep their new owner.
pub fn chown_tree(path: &Path, owner: Ownership) -> Result<()> {
    for entry in WalkDir::new(path)
        .follow_links(false)
        .follow_root_links(false)
    {
        let entry = entry.map_err(|e| {
            let at = e.path().unwrap_or(path).to_path_buf();
            StevedoreError::io(at, e.into())
        })?;
        chown_path(entry.path(), owner)?;
    }
    tracing::trace!(path = %path.display(), owner = %owner, "tree re-owned");
    Ok(())
}

/// Returns the effective uid and gid of the current process.
#[must_use]
pub fn current_owner() -> Ownership {
    Ownership {
        uid: nix::unistd::geteuid().as_raw(),
        gid: nix::unistd::getegid().as_raw(),
    }
}

/// Returns whether the current process may hand files to other owners.
#[must_use]
pub fn can_chown_freely() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::MetadataExt;

    use super::*;

    fn owner_of(path: &Path) -> Ownership {
        let meta = std::fs::symlink_metadata(path).expect("stat");
        Ownership {
            uid: meta.uid(),
            gid: meta.gid(),
        }
    }

    #[test]
    fn chown_tree_walks_nested_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tree = dir.path().join("tree");
        std::fs::create_dir_all(tree.join("a/b")).expect("mkdir");
        std::fs::write(tree.join("a/b/file"), b"x").expect("write");
        std::os::unix::fs::symlink("/etc/hostname", tree.join("a/link")).expect("symlink");

        let me = current_owner();
        chown_tree(&tree, me).expect("chown");
        assert_eq!(owner_of(&tree.join("a/b/file")), me);
        assert_eq!(owner_of(&tree.join("a/link")), me);
    }

    #[test]
    fn chown_tree_on_a_plain_file_touches_only_it() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("single");
        std::fs::write(&file, b"x").expect("write");
        let me = current_owner();
        chown_tree(&file, me).expect("chown");
        assert_eq!(owner_of(&file), me);
    }

    #[test]
    fn chown_tree_never_descends_through_directory_links() {
        if !can_chown_freely() {
            return;
        }
        let dir = tempfile::tempdir().expect("tempdir");
        let outside = dir.path().join("outside");
        std::fs::create_dir_all(&outside).expect("mkdir");
        std::fs::write(outside.join("host.conf"), b"x").expect("write");
        let tree = dir.path().join("tree");
        std::fs::create_dir_all(&tree).expect("mkdir");
        std::os::unix::fs::symlink(&outside, tree.join("escape")).expect("symlink");

        let before = owner_of(&outside.join("host.conf"));
        let owner = Ownership {
            uid: 4242,
            gid: 4242,
        };
        chown_tree(&tree, owner).expect("chown");
        assert_eq!(owner_of(&tree.join("escape")), owner);
        assert_eq!(owner_of(&outside.join("host.conf")), before);
    }

    #[test]
    fn chown_tree_missing_path_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(chown_tree(&dir.path().join("missing"), current_owner()).is_err());
    }

    #[test]
    fn chown_path_to_other_owner_as_root() {
        if !can_chown_freely() {
            return;
        }
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("f");
        std::fs::write(&file, b"x").expect("write");
        let owner = Ownership {
            uid: 1000,
            gid: 1000,
        };
        chown_path(&file, owner).expect("chown");
        assert_eq!(owner_of(&file), owner);
    }
}
