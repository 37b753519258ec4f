//! Local catalog of build containers.
//!
//! Maintains a JSON index of the build containers the CLI can ingest into.

use std::path::{Path, PathBuf};

use stevedore_common::error::{Result, StevedoreError};

use crate::container::BuildContainer;

/// Build-container catalog backed by a JSON file.
#[derive(Debug)]
pub struct ContainerCatalog {
    catalog_path: PathBuf,
}

impl ContainerCatalog {
    /// Opens or creates a catalog at the given file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog directory cannot be created.
    pub fn open(catalog_path: &Path) -> Result<Self> {
        if let Some(parent) = catalog_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StevedoreError::io(parent, e))?;
        }
        Ok(Self {
            catalog_path: catalog_path.to_path_buf(),
        })
    }

    /// Lists all build containers in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog file cannot be read or parsed.
    pub fn list(&self) -> Result<Vec<BuildContainer>> {
        if !self.catalog_path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.catalog_path)
            .map_err(|e| StevedoreError::io(&self.catalog_path, e))?;
        let entries: Vec<BuildContainer> = serde_json::from_str(&content)?;
        Ok(entries)
    }

    /// Registers a new build container.
    ///
    /// # Errors
    ///
    /// Returns `StevedoreError::Config` if the name or id is already taken,
    /// or an error if the catalog cannot be read or written.
    pub fn register(&self, container: BuildContainer) -> Result<()> {
        let mut entries = self.list()?;
        if entries
            .iter()
            .any(|e| e.name == container.name || e.id == container.id)
        {
            return Err(StevedoreError::Config {
                message: format!("build container {} already exists", container.name),
            });
        }
        tracing::info!(id = %container.id, name = %container.name, "registering build container");
        entries.push(container);
        self.write_entries(&entries)
    }

    /// Finds a build container by name or id.
    ///
    /// # Errors
    ///
    /// Returns `StevedoreError::NotFound` if nothing matches.
    pub fn find(&self, name_or_id: &str) -> Result<BuildContainer> {
        self.list()?
            .into_iter()
            .find(|e| e.name == name_or_id || e.id.as_str() == name_or_id)
            .ok_or_else(|| StevedoreError::NotFound {
                kind: "build container",
                id: name_or_id.to_string(),
            })
    }

    /// Removes a build container by name or id.
    ///
    /// # Errors
    ///
    /// Returns `StevedoreError::NotFound` if nothing matches.
    pub fn remove(&self, name_or_id: &str) -> Result<()> {
        let mut entries = self.list()?;
        let before = entries.len();
        entries.retain(|e| e.name != name_or_id && e.id.as_str() != name_or_id);
        if entries.len() == before {
            return Err(StevedoreError::NotFound {
                kind: "build container",
                id: name_or_id.to_string(),
            });
        }
        self.write_entries(&entries)
    }

    fn write_entries(&self, entries: &[BuildContainer]) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.catalog_path, json)
            .map_err(|e| StevedoreError::io(&self.catalog_path, e))
    }
}
