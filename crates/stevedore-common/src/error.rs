//! Unified error types for the Stevedore workspace.
//!
//! Every variant carries the path, source, or identity it concerns so that a
//! failure deep inside an ingestion can be reported without extra wrapping.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed cause carried by [`StevedoreError::Transfer`].
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum StevedoreError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The destination's parent (or the destination itself) exists but is
    /// not a directory.
    #[error("{path} already exists, but is not a directory")]
    InvalidDestination {
        /// Offending path inside the mounted root.
        path: PathBuf,
    },

    /// Several sources were given but the destination is not a directory.
    #[error("destination {path} is not a directory")]
    AmbiguousDestination {
        /// Resolved destination path.
        path: PathBuf,
    },

    /// A glob pattern expanded to zero paths.
    #[error("no files found matching {pattern:?}")]
    NoSuchSource {
        /// The pattern exactly as given.
        pattern: String,
    },

    /// A source token could not be interpreted.
    #[error("invalid source {source_ref:?}: {message}")]
    InvalidSource {
        /// The raw source token.
        source_ref: String,
        /// Why it was rejected.
        message: String,
    },

    /// A remote body was shorter or longer than its declared length.
    #[error("error reading contents for {path}: wrong length ({actual} != {expected})")]
    TransferLengthMismatch {
        /// File the body was written to.
        path: PathBuf,
        /// Length declared by the response.
        expected: u64,
        /// Bytes actually written.
        actual: u64,
    },

    /// A user or group name could not be mapped to a numeric id.
    #[error("error looking up {kind} {name:?}: {reason}")]
    IdentityResolution {
        /// `"user"` or `"group"`.
        kind: &'static str,
        /// The unresolved name.
        name: String,
        /// What went wrong during the lookup.
        reason: String,
    },

    /// Copying, extracting, or fetching a source failed.
    #[error("error copying {source_ref} to {destination}: {source}")]
    Transfer {
        /// The source being transferred.
        source_ref: String,
        /// Where it was going.
        destination: PathBuf,
        /// Underlying failure.
        source: BoxedCause,
    },

    /// The build container's filesystem could not be mounted.
    #[error("failed to mount {target}: {message}")]
    Mount {
        /// Mount target or container name.
        target: String,
        /// Description of the failure.
        message: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl StevedoreError {
    /// Builds an [`StevedoreError::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wraps any error as a transfer failure of `source_ref` into `destination`.
    pub fn transfer(
        source_ref: impl Into<String>,
        destination: impl Into<PathBuf>,
        cause: impl Into<BoxedCause>,
    ) -> Self {
        Self::Transfer {
            source_ref: source_ref.into(),
            destination: destination.into(),
            source: cause.into(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, StevedoreError>;
