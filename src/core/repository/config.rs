//! Repository configuration.

use crate::core::importer::CopyPermissions;
use crate::error::RepositoryError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default location of the persisted content index
pub const DEFAULT_INDEX_PATH: &str = "db/repo.index.json";

/// Per-repository settings.
///
/// Missing fields in a settings file take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Refuse every physical copy into the repository
    pub locked: bool,
    /// Allow an insert to replace an existing file
    pub allow_overwrite: bool,
    /// Where the content index is saved; relative paths resolve against
    /// the working directory
    pub index_path: PathBuf,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            locked: true,
            allow_overwrite: false,
            index_path: PathBuf::from(DEFAULT_INDEX_PATH),
        }
    }
}

impl RepositoryConfig {
    /// Parse settings from a JSON document
    pub fn from_json(json: &str) -> Result<Self, RepositoryError> {
        serde_json::from_str(json).map_err(|e| RepositoryError::Config(e.to_string()))
    }

    /// Read settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, RepositoryError> {
        let json = fs::read_to_string(path)
            .map_err(|e| RepositoryError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn permissions(&self) -> CopyPermissions {
        CopyPermissions {
            locked: self.locked,
            allow_overwrite: self.allow_overwrite,
        }
    }
}
