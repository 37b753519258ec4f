//! Domain primitive types used across the Stevedore workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a build container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a new container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random container ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One half of an ownership request, before any lookup happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdSpec {
    /// Nothing was given.
    Unspecified,
    /// A numeric id, used as-is.
    Numeric(u32),
    /// A name to resolve against the mounted root's identity files.
    Named(String),
}

impl IdSpec {
    /// Classifies a raw user or group string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            Self::Unspecified
        } else if let Ok(id) = raw.parse::<u32>() {
            Self::Numeric(id)
        } else {
            Self::Named(raw.to_string())
        }
    }

    /// Returns whether a value was given.
    #[must_use]
    pub const fn is_specified(&self) -> bool {
        !matches!(self, Self::Unspecified)
    }
}

/// Ownership specification for an ingestion.
///
/// Each field is empty (no change), a numeric string, or a name. Ownership
/// is only ever applied when both fields are non-empty; a half-specified
/// pair means "leave ownership alone".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionOptions {
    /// User name or numeric uid.
    pub user: String,
    /// Group name or numeric gid.
    pub group: String,
}

impl IngestionOptions {
    /// Creates options for the given user and group.
    #[must_use]
    pub fn new(user: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            group: group.into(),
        }
    }

    /// Parses a `USER[:GROUP]` chown string.
    ///
    /// A missing group reuses the user value.
    #[must_use]
    pub fn from_chown(chown: &str) -> Self {
        match chown.split_once(':') {
            Some((user, group)) => Self::new(user, group),
            None => Self::new(chown, chown),
        }
    }

    /// Returns both specs when, and only when, both are specified.
    #[must_use]
    pub fn ownership_specs(&self) -> Option<(IdSpec, IdSpec)> {
        let user = IdSpec::parse(&self.user);
        let group = IdSpec::parse(&self.group);
        if user.is_specified() && group.is_specified() {
            Some((user, group))
        } else {
            if user.is_specified() || group.is_specified() {
                tracing::debug!(
                    user = %self.user,
                    group = %self.group,
                    "partial ownership spec, ownership left unchanged"
                );
            }
            None
        }
    }
}

/// A resolved numeric owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ownership {
    /// Numeric user id.
    pub uid: u32,
    /// Numeric group id.
    pub gid: u32,
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.uid, self.gid)
    }
}
