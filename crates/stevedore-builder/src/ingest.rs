//! Ingestion orchestrator.
//!
//! Brackets an add/copy operation with the build container's mount, resolves
//! ownership and destination once, then transfers each source in argument
//! order. The first failure stops the iteration; whatever was already
//! written stays in place.

use std::path::{Path, PathBuf};

use stevedore_common::config::StevedoreConfig;
use stevedore_common::error::{Result, StevedoreError};
use stevedore_common::types::{IngestionOptions, Ownership};
use stevedore_core::filesystem::mount::{MountGuard, RootfsMount};
use stevedore_core::filesystem::paths::ensure_dir;
use stevedore_core::identity::resolve_ownership;
use stevedore_core::ownership::{chown_path, chown_tree};
use stevedore_image::fetch::{HttpFetcher, RemoteFetch};
use stevedore_image::source::{
    OwnershipPolicy, SourceItem, SourceKind, Url, classify_match, expand_pattern,
    resolve_source, url_file_name,
};
use stevedore_image::transfer::{ContentTransfer, TarTransfer};

use crate::container::BuildContainer;
use crate::destination::{ResolvedDestination, ensure_work_dir, resolve_destination};

/// One transferred item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingested {
    /// The source token it came from.
    pub source: String,
    /// Where it was written (the destination directory for trees and archives).
    pub target: PathBuf,
    /// What the source turned out to be.
    pub kind: SourceKind,
    /// Whether ownership was applied after the transfer.
    pub owner_applied: bool,
}

/// Ingests content into one build container's root filesystem.
pub struct Ingester {
    work_dir: String,
    mount: Box<dyn RootfsMount>,
    transfer: Box<dyn ContentTransfer>,
    fetcher: Box<dyn RemoteFetch>,
}

impl Ingester {
    /// Creates an ingester with the tar transfer and the HTTP fetcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialised.
    pub fn new(work_dir: impl Into<String>, mount: Box<dyn RootfsMount>) -> Result<Self> {
        Ok(Self::with_http(work_dir, mount, HttpFetcher::new()?))
    }

    /// Creates an ingester for a catalogued build container.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialised.
    pub fn for_container(container: &BuildContainer, config: &StevedoreConfig) -> Result<Self> {
        Ok(Self::with_http(
            container.work_dir.clone(),
            container.rootfs.mount_provider(),
            HttpFetcher::new()?.offline(config.offline),
        ))
    }

    fn with_http(
        work_dir: impl Into<String>,
        mount: Box<dyn RootfsMount>,
        fetcher: HttpFetcher,
    ) -> Self {
        Self {
            work_dir: work_dir.into(),
            mount,
            transfer: Box::new(TarTransfer::new()),
            fetcher: Box::new(fetcher),
        }
    }

    /// Replaces the content transfer implementation.
    #[must_use]
    pub fn with_transfer(mut self, transfer: Box<dyn ContentTransfer>) -> Self {
        self.transfer = transfer;
        self
    }

    /// Replaces the remote fetcher.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Box<dyn RemoteFetch>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Copies `sources` into the container at `destination`.
    ///
    /// With `extract_archives`, local archives are unpacked into the
    /// destination instead of being copied. Ownership from `options` is
    /// applied only when both user and group are given.
    ///
    /// The container root is unmounted before returning, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns the first error met: mount failure, unresolvable ownership,
    /// invalid or ambiguous destination, a pattern without matches, or a
    /// failed transfer.
    pub fn ingest(
        &mut self,
        destination: &str,
        extract_archives: bool,
        options: &IngestionOptions,
        sources: &[String],
    ) -> Result<Vec<Ingested>> {
        let guard = MountGuard::acquire(self.mount.as_mut())?;
        let session = Session {
            root: guard.root(),
            work_dir: &self.work_dir,
            transfer: self.transfer.as_ref(),
            fetcher: self.fetcher.as_ref(),
            extract_archives,
        };
        session.run(destination, options, sources)
    }
}

impl std::fmt::Debug for Ingester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingester")
            .field("work_dir", &self.work_dir)
            .finish_non_exhaustive()
    }
}

/// State of one ingestion while the root is mounted.
struct Session<'a> {
    root: &'a Path,
    work_dir: &'a str,
    transfer: &'a dyn ContentTransfer,
    fetcher: &'a dyn RemoteFetch,
    extract_archives: bool,
}

impl Session<'_> {
    fn run(
        &self,
        destination: &str,
        options: &IngestionOptions,
        sources: &[String],
    ) -> Result<Vec<Ingested>> {
        let ownership = resolve_ownership(self.root, options)?;
        let dest = resolve_destination(self.root, self.work_dir, destination)?;
        if sources.len() > 1 && !dest.is_dir {
            return Err(StevedoreError::AmbiguousDestination { path: dest.path });
        }
        ensure_work_dir(self.root, self.work_dir, destination)?;

        let mut ingested = Vec::with_capacity(sources.len());
        for source in sources {
            match resolve_source(source)? {
                SourceItem::Remote(url) => {
                    ingested.push(self.ingest_url(source, &url, &dest, ownership)?);
                }
                SourceItem::Pattern(pattern) => {
                    for path in expand_pattern(&pattern)? {
                        ingested.push(self.ingest_path(source, &path, &dest, ownership)?);
                    }
                }
            }
        }

        tracing::info!(
            destination = %dest.path.display(),
            items = ingested.len(),
            "ingestion complete"
        );
        Ok(ingested)
    }

    fn ingest_url(
        &self,
        source: &str,
        url: &Url,
        dest: &ResolvedDestination,
        ownership: Option<Ownership>,
    ) -> Result<Ingested> {
        let target = if dest.is_dir {
            let name = url_file_name(url).ok_or_else(|| StevedoreError::InvalidSource {
                source_ref: source.to_string(),
                message: "URL path has no file name".into(),
            })?;
            dest.path.join(name)
        } else {
            dest.path.clone()
        };

        let _ = self.fetcher.fetch(url, &target)?;
        let kind = SourceKind::Remote;
        let owner_applied = apply_ownership(&target, ownership, kind.ownership_policy())?;
        Ok(Ingested {
            source: source.to_string(),
            target,
            kind,
            owner_applied,
        })
    }

    fn ingest_path(
        &self,
        source: &str,
        path: &Path,
        dest: &ResolvedDestination,
        ownership: Option<Ownership>,
    ) -> Result<Ingested> {
        let kind = classify_match(path, self.extract_archives, self.transfer)?;
        let failed = |e: StevedoreError, to: &Path| {
            StevedoreError::transfer(path.display().to_string(), to, e)
        };

        let target = match kind {
            SourceKind::Directory => {
                ensure_dir(&dest.path)?;
                tracing::debug!(
                    from = %path.display(),
                    to = %dest.path.display(),
                    "copying directory contents"
                );
                self.transfer
                    .copy_tree(path, &dest.path)
                    .map_err(|e| failed(e, &dest.path))?;
                dest.path.clone()
            }
            SourceKind::Archive => {
                tracing::debug!(
                    from = %path.display(),
                    to = %dest.path.display(),
                    "extracting archive"
                );
                self.transfer
                    .extract_archive(path, &dest.path)
                    .map_err(|e| failed(e, &dest.path))?;
                dest.path.clone()
            }
            SourceKind::PlainFile | SourceKind::Remote => {
                let name = path.file_name().ok_or_else(|| StevedoreError::InvalidSource {
                    source_ref: source.to_string(),
                    message: format!("{} has no file name", path.display()),
                })?;
                let target = dest.target_for(name);
                tracing::debug!(from = %path.display(), to = %target.display(), "copying file");
                self.transfer
                    .copy_file(path, &target)
                    .map_err(|e| failed(e, &target))?;
                target
            }
        };

        let owner_applied = apply_ownership(&target, ownership, kind.ownership_policy())?;
        Ok(Ingested {
            source: source.to_string(),
            target,
            kind,
            owner_applied,
        })
    }
}

/// Applies `ownership` to `target` under `policy`; returns whether it did.
fn apply_ownership(
    target: &Path,
    ownership: Option<Ownership>,
    policy: OwnershipPolicy,
) -> Result<bool> {
    let Some(owner) = ownership else {
        return Ok(false);
    };
    match policy {
        OwnershipPolicy::Recursive => chown_tree(target, owner)?,
        OwnershipPolicy::TargetOnly => chown_path(target, owner)?,
        OwnershipPolicy::PreserveEmbedded => return Ok(false),
    }
    tracing::debug!(path = %target.display(), owner = %owner, ?policy, "ownership applied");
    Ok(true)
}
