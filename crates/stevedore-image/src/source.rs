//! Source classification.
//!
//! A source token is either a remote URL (`http://`, `https://`) or a
//! filesystem glob. Each glob match is then classified as a directory, a
//! plain file, or an archive, and every kind carries the ownership policy
//! the orchestrator applies after transferring it.

use std::fmt;
use std::path::{Path, PathBuf};

pub use reqwest::Url;
use stevedore_common::error::{Result, StevedoreError};

use crate::transfer::ContentTransfer;

/// A raw source token, before expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceItem {
    /// Remote HTTP(S) source.
    Remote(Url),
    /// Local path or glob pattern.
    Pattern(String),
}

/// What a single source turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Downloaded from a URL.
    Remote,
    /// Local directory; its contents are copied.
    Directory,
    /// Local file copied verbatim.
    PlainFile,
    /// Local archive extracted into the destination.
    Archive,
}

/// How ownership is applied after a source has been transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnershipPolicy {
    /// Re-own the destination directory and everything below it.
    Recursive,
    /// Re-own the written file only.
    TargetOnly,
    /// Keep the ownership recorded inside the archive.
    PreserveEmbedded,
}

impl SourceKind {
    /// Ownership policy for this kind of source.
    #[must_use]
    pub const fn ownership_policy(self) -> OwnershipPolicy {
        match self {
            Self::Directory => OwnershipPolicy::Recursive,
            Self::Remote | Self::PlainFile => OwnershipPolicy::TargetOnly,
            Self::Archive => OwnershipPolicy::PreserveEmbedded,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Directory => write!(f, "directory"),
            Self::PlainFile => write!(f, "file"),
            Self::Archive => write!(f, "archive"),
        }
    }
}

/// Resolves a raw source token into a [`SourceItem`].
///
/// # Errors
///
/// Returns [`StevedoreError::InvalidSource`] if a URL-looking token does
/// not parse.
pub fn resolve_source(token: &str) -> Result<SourceItem> {
    if token.starts_with("http://") || token.starts_with("https://") {
        let url = Url::parse(token).map_err(|e| StevedoreError::InvalidSource {
            source_ref: token.to_string(),
            message: format!("error parsing URL: {e}"),
        })?;
        Ok(SourceItem::Remote(url))
    } else {
        Ok(SourceItem::Pattern(token.to_string()))
    }
}

/// Returns the last path element of a URL, as the saved file name.
///
/// Trailing slashes are ignored; `None` when the path has no element.
#[must_use]
pub fn url_file_name(url: &Url) -> Option<String> {
    url.path()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_owned)
}

/// Expands a glob pattern against the host filesystem.
///
/// Matches come back in lexical order. Unreadable directories encountered
/// while matching are skipped.
///
/// # Errors
///
/// Returns [`StevedoreError::InvalidSource`] for a malformed pattern and
/// [`StevedoreError::NoSuchSource`] when nothing matches.
pub fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern).map_err(|e| StevedoreError::InvalidSource {
        source_ref: pattern.to_string(),
        message: format!("invalid glob: {e}"),
    })?;

    let mut matches = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => matches.push(path),
            Err(e) => {
                tracing::debug!(
                    path = %e.path().display(),
                    error = %e.error(),
                    "skipping unreadable path"
                );
            }
        }
    }

    if matches.is_empty() {
        return Err(StevedoreError::NoSuchSource {
            pattern: pattern.to_string(),
        });
    }
    Ok(matches)
}

/// Classifies one expanded match.
///
/// Archives are only recognised when `extract` is set; otherwise they are
/// plain files.
///
/// # Errors
///
/// Returns an error if `path` cannot be stat'ed.
pub fn classify_match(
    path: &Path,
    extract: bool,
    transfer: &dyn ContentTransfer,
) -> Result<SourceKind> {
    let meta = std::fs::metadata(path).map_err(|e| StevedoreError::io(path, e))?;
    if meta.is_dir() {
        Ok(SourceKind::Directory)
    } else if extract && transfer.is_archive(path) {
        Ok(SourceKind::Archive)
    } else {
        Ok(SourceKind::PlainFile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::TarTransfer;

    #[test]
    fn resolve_https_source_returns_remote() {
        let source = resolve_source("https://example.com/image.tar").expect("resolve failed");
        assert!(matches!(source, SourceItem::Remote(_)));
    }

    #[test]
    fn resolve_http_source_returns_remote() {
        let source = resolve_source("http://example.com/a/b.txt").expect("resolve failed");
        assert!(matches!(source, SourceItem::Remote(ref u) if u.path() == "/a/b.txt"));
    }

    #[test]
    fn resolve_other_schemes_are_patterns() {
        assert_eq!(
            resolve_source("ftp://example.com/x").expect("resolve"),
            SourceItem::Pattern("ftp://example.com/x".into())
        );
        assert_eq!(
            resolve_source("./conf/*.yaml").expect("resolve"),
            SourceItem::Pattern("./conf/*.yaml".into())
        );
    }

    #[test]
    fn resolve_malformed_url_fails() {
        assert!(matches!(
            resolve_source("http://[::1"),
            Err(StevedoreError::InvalidSource { .. })
        ));
    }

    #[test]
    fn url_file_name_takes_last_element() {
        let name = |s: &str| url_file_name(&Url::parse(s).expect("url"));
        assert_eq!(name("https://h/dl/tool.tar.gz?v=2").as_deref(), Some("tool.tar.gz"));
        assert_eq!(name("https://h/dl/dir/").as_deref(), Some("dir"));
        assert_eq!(name("https://h/"), None);
        assert_eq!(name("https://h"), None);
    }

    #[test]
    fn expand_pattern_sorts_matches() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["b.conf", "a.conf", "c.txt"] {
            std::fs::write(dir.path().join(name), b"x").expect("write");
        }
        let pattern = format!("{}/*.conf", dir.path().display());
        let matches = expand_pattern(&pattern).expect("expand");
        assert_eq!(
            matches,
            vec![dir.path().join("a.conf"), dir.path().join("b.conf")]
        );
    }

    #[test]
    fn expand_pattern_without_matches_names_pattern() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pattern = format!("{}/*.missing", dir.path().display());
        let err = expand_pattern(&pattern).unwrap_err();
        assert!(matches!(err, StevedoreError::NoSuchSource { pattern: ref p } if *p == pattern));
    }

    #[test]
    fn expand_malformed_pattern_fails() {
        assert!(matches!(
            expand_pattern("src/[unclosed"),
            Err(StevedoreError::InvalidSource { .. })
        ));
    }

    #[test]
    fn classify_respects_extract_flag() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tar_path = dir.path().join("bundle.tar");
        let mut builder = tar::Builder::new(std::fs::File::create(&tar_path).expect("create"));
        let mut header = tar::Header::new_gnu();
        header.set_size(1);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "x", &b"x"[..]).expect("append");
        builder.finish().expect("finish");

        let transfer = TarTransfer::new();
        assert_eq!(
            classify_match(&tar_path, true, &transfer).expect("classify"),
            SourceKind::Archive
        );
        assert_eq!(
            classify_match(&tar_path, false, &transfer).expect("classify"),
            SourceKind::PlainFile
        );
        assert_eq!(
            classify_match(dir.path(), true, &transfer).expect("classify"),
            SourceKind::Directory
        );
    }

    #[test]
    fn ownership_policy_per_kind() {
        assert_eq!(SourceKind::Directory.ownership_policy(), OwnershipPolicy::Recursive);
        assert_eq!(SourceKind::PlainFile.ownership_policy(), OwnershipPolicy::TargetOnly);
        assert_eq!(SourceKind::Remote.ownership_policy(), OwnershipPolicy::TargetOnly);
        assert_eq!(
            SourceKind::Archive.ownership_policy(),
            OwnershipPolicy::PreserveEmbedded
        );
    }
}
