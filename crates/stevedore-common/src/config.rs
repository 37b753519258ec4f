//! Global configuration model for Stevedore.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StevedoreError};

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StevedoreConfig {
    /// Base directory for Stevedore state and data.
    pub data_dir: PathBuf,
    /// Path to the build-container catalog.
    pub catalog_file: PathBuf,
    /// Whether offline mode is enabled (remote sources are refused).
    pub offline: bool,
}

impl Default for StevedoreConfig {
    fn default() -> Self {
        Self {
            data_dir: crate::constants::data_dir().clone(),
            catalog_file: crate::constants::default_catalog_file(),
            offline: false,
        }
    }
}

impl StevedoreConfig {
    /// Reads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| StevedoreError::io(path, e))?;
        let config: Self = serde_json::from_str(&content)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Reads `path` if it exists, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
