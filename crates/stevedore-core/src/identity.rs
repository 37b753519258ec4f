//! User and group lookup against a mounted root.
//!
//! Names are resolved through the root's own `etc/passwd` and `etc/group`,
//! never the host's. Files are re-read on every call.

use std::io::{BufRead, BufReader};
use std::path::Path;

use stevedore_common::constants::{GROUP_FILE, PASSWD_FILE};
use stevedore_common::error::{Result, StevedoreError};
use stevedore_common::types::{IdSpec, IngestionOptions, Ownership};

/// Which identity database a lookup goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityDb {
    /// `etc/passwd`.
    Passwd,
    /// `etc/group`.
    Group,
}

impl IdentityDb {
    /// Path of this database relative to a root.
    #[must_use]
    pub const fn relative_path(self) -> &'static str {
        match self {
            Self::Passwd => PASSWD_FILE,
            Self::Group => GROUP_FILE,
        }
    }

    const fn kind(self) -> &'static str {
        match self {
            Self::Passwd => "user",
            Self::Group => "group",
        }
    }
}

/// Finds `name` in a colon-separated identity file and returns field 2.
///
/// Blank lines and lines starting with `#` are skipped. The first record
/// whose field 0 equals `name` decides the result.
///
/// # Errors
///
/// Returns [`StevedoreError::IdentityResolution`] if the file cannot be
/// read, the name is absent, or the matching record is malformed.
pub fn find_id(colon_file: &Path, name: &str, db: IdentityDb) -> Result<u32> {
    let failure = |reason: String| StevedoreError::IdentityResolution {
        kind: db.kind(),
        name: name.to_string(),
        reason,
    };

    let file = std::fs::File::open(colon_file)
        .map_err(|e| failure(format!("error opening {}: {e}", colon_file.display())))?;

    for line in BufReader::new(file).lines() {
        let line =
            line.map_err(|e| failure(format!("error reading {}: {e}", colon_file.display())))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split(':');
        if fields.next() != Some(name) {
            continue;
        }
        let id = fields
            .nth(1)
            .ok_or_else(|| failure(format!("malformed record in {}", colon_file.display())))?;
        return id
            .parse::<u32>()
            .map_err(|e| failure(format!("invalid id {id:?}: {e}")));
    }

    Err(failure(format!("no entry in {}", colon_file.display())))
}

/// Resolves one id spec under `root`.
fn resolve_spec(root: &Path, spec: &IdSpec, db: IdentityDb) -> Result<u32> {
    match spec {
        IdSpec::Numeric(id) => Ok(*id),
        IdSpec::Named(name) => {
            let path = root.join(db.relative_path());
            let id = find_id(&path, name, db)?;
            tracing::debug!(name = %name, id, db = ?db, "resolved identity");
            Ok(id)
        }
        IdSpec::Unspecified => Err(StevedoreError::IdentityResolution {
            kind: db.kind(),
            name: String::new(),
            reason: "no value given".into(),
        }),
    }
}

/// Resolves the ownership requested by `options` against a mounted root.
///
/// Returns `None` unless both user and group are given; in that case no
/// ownership change is to be made.
///
/// # Errors
///
/// Returns [`StevedoreError::IdentityResolution`] naming the first user or
/// group that cannot be resolved.
pub fn resolve_ownership(root: &Path, options: &IngestionOptions) -> Result<Option<Ownership>> {
    let Some((user, group)) = options.ownership_specs() else {
        return Ok(None);
    };
    let uid = resolve_spec(root, &user, IdentityDb::Passwd)?;
    let gid = resolve_spec(root, &group, IdentityDb::Group)?;
    Ok(Some(Ownership { uid, gid }))
}
