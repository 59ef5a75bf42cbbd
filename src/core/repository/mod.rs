//! # Repository Module
//!
//! A directory tree of media files, optionally guarded by a content index.
//!
//! ## Insert flow
//! 1. Validate the call (root, policy flags, destination)
//! 2. Reject content already in the index, when one is attached
//! 3. Resolve the destination directory
//! 4. Apply the collision policy and copy
//!
//! Steps 1-3 never touch the filesystem; a failure at any step leaves the
//! repository unchanged.
//!
//! ## Example
//! ```rust,ignore
//! let repo = Repository::builder()
//!     .root("/photos/repo")
//!     .locked(false)
//!     .build()?;
//!
//! let file = MediaFile::open("/card/DCIM/IMG_0001.jpg")?;
//! let placed = repo.insert(&file, None, InsertOptions::default())?;
//! ```

mod config;

pub use config::{RepositoryConfig, DEFAULT_INDEX_PATH};

use crate::core::destination::Destination;
use crate::core::importer::{CollisionPolicy, ImportedFile, Importer};
use crate::core::index::ContentIndex;
use crate::core::media::MediaFile;
use crate::error::{RepositoryError, Result};
use crate::events::{null_sender, EventSender};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Flags for a single insert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOptions {
    /// Replace an existing file of the same name
    pub overwrite: bool,
    /// Pick `name_N.ext` instead of colliding
    pub alternate_names: bool,
    /// Run every check but copy nothing
    pub dry_run: bool,
}

impl InsertOptions {
    /// Strict policy: fail on any name collision
    pub fn strict(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> std::result::Result<CollisionPolicy, RepositoryError> {
        CollisionPolicy::from_flags(self.overwrite, self.alternate_names)
    }
}

/// Builder for a [`Repository`]
#[derive(Debug, Default)]
pub struct RepositoryBuilder {
    root: Option<PathBuf>,
    config: RepositoryConfig,
}

impl RepositoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing directory to use as the repository root
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: RepositoryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.config.locked = locked;
        self
    }

    pub fn allow_overwrite(mut self, allow: bool) -> Self {
        self.config.allow_overwrite = allow;
        self
    }

    pub fn index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.index_path = path.into();
        self
    }

    /// Build the repository, validating the root when one was given
    pub fn build(self) -> std::result::Result<Repository, RepositoryError> {
        let root = match self.root {
            Some(root) => Some(validate_root(&root)?),
            None => None,
        };
        Ok(Repository {
            root,
            config: self.config,
            index: None,
        })
    }
}

/// The media repository
#[derive(Debug)]
pub struct Repository {
    root: Option<PathBuf>,
    config: RepositoryConfig,
    index: Option<ContentIndex>,
}

impl Repository {
    pub fn builder() -> RepositoryBuilder {
        RepositoryBuilder::new()
    }

    /// Open an existing directory with default configuration
    pub fn open(root: impl Into<PathBuf>) -> std::result::Result<Self, RepositoryError> {
        Self::builder().root(root).build()
    }

    /// Give an unrooted repository a root, creating missing directories
    pub fn create(&mut self, root: impl AsRef<Path>) -> std::result::Result<(), RepositoryError> {
        let root = root.as_ref();
        if let Some(existing) = &self.root {
            return Err(RepositoryError::AlreadyRooted {
                path: existing.clone(),
            });
        }

        fs::create_dir_all(root).map_err(|e| RepositoryError::InvalidRoot {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;
        self.root = Some(validate_root(root)?);
        info!(root = %root.display(), "repository created");
        Ok(())
    }

    /// Whether the repository has a root that is still a directory
    pub fn is_valid(&self) -> bool {
        self.root.as_deref().is_some_and(Path::is_dir)
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    fn require_root(&self) -> std::result::Result<&Path, RepositoryError> {
        match self.root.as_deref() {
            Some(root) if root.is_dir() => Ok(root),
            _ => Err(RepositoryError::NotInitialized),
        }
    }

    /// Absolute location the index is saved to and loaded from
    pub fn index_path(&self) -> PathBuf {
        std::path::absolute(&self.config.index_path)
            .unwrap_or_else(|_| self.config.index_path.clone())
    }

    /// Attach an index; later inserts reject content it already holds
    pub fn attach_index(&mut self, index: ContentIndex) {
        self.index = Some(index);
    }

    /// Remove the index, returning it
    pub fn detach_index(&mut self) -> Option<ContentIndex> {
        self.index.take()
    }

    pub fn index(&self) -> Option<&ContentIndex> {
        self.index.as_ref()
    }

    /// Scan the whole repository into a fresh index and attach it
    pub fn build_index(&mut self) -> Result<&ContentIndex> {
        self.build_index_with_events(&null_sender())
    }

    pub fn build_index_with_events(&mut self, events: &EventSender) -> Result<&ContentIndex> {
        let root = self.require_root()?;
        let index = ContentIndex::scan_with_events(root, events)?;
        Ok(&*self.index.insert(index))
    }

    /// Save the attached index to [`Repository::index_path`]
    pub fn save_index(&self) -> Result<PathBuf> {
        let index = self.index.as_ref().ok_or(RepositoryError::NoIndex)?;
        let path = self.index_path();
        index.save(&path)?;
        Ok(path)
    }

    /// Load the index from [`Repository::index_path`] and attach it
    pub fn load_index(&mut self) -> Result<&ContentIndex> {
        let index = ContentIndex::load(&self.index_path())?;
        Ok(&*self.index.insert(index))
    }

    /// Insert one file.
    ///
    /// `dest` of `None` files by capture date (`<root>/<YYYY>/<MM>`);
    /// `Some(relative)` files under that path regardless of metadata.
    pub fn insert(
        &self,
        file: &MediaFile,
        dest: Option<&Path>,
        options: InsertOptions,
    ) -> Result<ImportedFile> {
        let root = self.require_root()?;
        let policy = options.policy()?;
        let destination = Destination::from_option(dest)?;

        if let Some(index) = &self.index {
            index.check(file.path())?;
        }

        let dir = destination.resolve(root, file)?;
        let importer = Importer::new(policy, self.config.permissions(), options.dry_run);
        Ok(importer.import(file, &dir)?)
    }
}

fn validate_root(root: &Path) -> std::result::Result<PathBuf, RepositoryError> {
    let invalid = |reason: &str| RepositoryError::InvalidRoot {
        path: root.to_path_buf(),
        reason: reason.to_string(),
    };

    if !root.exists() {
        return Err(invalid("does not exist"));
    }
    if !root.is_dir() {
        return Err(invalid("not a directory"));
    }
    std::path::absolute(root).map_err(|e| invalid(&e.to_string()))
}
