//! # Importer Module
//!
//! Collision policies and the single-file import they drive.
//!
//! ## Policies
//! - **Overwrite** - copy under the original name, replacing a file
//!   already there (needs `allow_overwrite`)
//! - **AlternateName** - append `_1`, `_2`, ... before the extension
//!   until the name is free
//! - **Strict** - fail on any case-insensitive name collision
//!
//! Whatever the policy, the final path may never be an existing
//! directory.

mod copy;

use crate::core::media::MediaFile;
use crate::error::{ImportError, RepositoryError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// What to do when the destination name is taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    Overwrite,
    AlternateName,
    Strict,
}

impl CollisionPolicy {
    /// Select a policy from the two insert flags.
    ///
    /// Setting both is a usage error: an alternate name never overwrites.
    pub fn from_flags(overwrite: bool, alternate_names: bool) -> Result<Self, RepositoryError> {
        match (overwrite, alternate_names) {
            (true, false) => Ok(CollisionPolicy::Overwrite),
            (false, true) => Ok(CollisionPolicy::AlternateName),
            (false, false) => Ok(CollisionPolicy::Strict),
            (true, true) => Err(RepositoryError::ConflictingPolicy),
        }
    }

    /// Final path for `basename` inside `dir`
    fn target(&self, dir: &Path, basename: &str) -> Result<PathBuf, ImportError> {
        match self {
            CollisionPolicy::Overwrite => Ok(dir.join(basename)),
            CollisionPolicy::AlternateName => Ok(alternate_target(dir, basename)),
            CollisionPolicy::Strict => {
                if let Some(path) = case_insensitive_match(dir, basename) {
                    return Err(ImportError::NameCollision { path });
                }
                Ok(dir.join(basename))
            }
        }
    }
}

/// Gates applied to every real copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyPermissions {
    /// Refuse all physical copies
    pub locked: bool,
    /// Allow replacing an existing file
    pub allow_overwrite: bool,
}

/// A file placed (or, in a dry run, planned) in the repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub dry_run: bool,
}

/// Imports one file at a time under a fixed policy
#[derive(Debug, Clone)]
pub struct Importer {
    policy: CollisionPolicy,
    permissions: CopyPermissions,
    dry_run: bool,
}

impl Importer {
    pub fn new(policy: CollisionPolicy, permissions: CopyPermissions, dry_run: bool) -> Self {
        Self {
            policy,
            permissions,
            dry_run,
        }
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Copy `file` into `dest_dir` under the active policy
    pub fn import(&self, file: &MediaFile, dest_dir: &Path) -> Result<ImportedFile, ImportError> {
        let original = dest_dir.join(file.basename());
        if original.is_dir() {
            return Err(ImportError::DestinationIsDirectory { path: original });
        }

        let target = self.policy.target(dest_dir, file.basename())?;
        copy::copy_into(file.path(), &target, &self.permissions, self.dry_run)?;

        Ok(ImportedFile {
            source: file.path().to_path_buf(),
            destination: target,
            dry_run: self.dry_run,
        })
    }
}

/// `name.ext`, then `name_1.ext`, `name_2.ext`, ... until one is free.
///
/// The counter starts over for every call.
fn alternate_target(dir: &Path, basename: &str) -> PathBuf {
    let candidate = dir.join(basename);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = split_name(basename);
    let mut suffix = 0usize;
    loop {
        suffix += 1;
        let name = match ext {
            Some(ext) => format!("{}_{}.{}", stem, suffix, ext),
            None => format!("{}_{}", stem, suffix),
        };
        let candidate = dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
    }
}

fn split_name(basename: &str) -> (&str, Option<&str>) {
    match basename.rfind('.') {
        Some(0) | None => (basename, None),
        Some(dot) => (&basename[..dot], Some(&basename[dot + 1..])),
    }
}

/// Existing file in `dir` whose name matches `basename` ignoring case.
///
/// Directories never match; a directory at the target name is reported
/// by the copy step instead.
fn case_insensitive_match(dir: &Path, basename: &str) -> Option<PathBuf> {
    for name in [basename.to_lowercase(), basename.to_uppercase()] {
        let path = dir.join(&name);
        if path.is_file() {
            return Some(path);
        }
    }

    let wanted = basename.to_lowercase();
    fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| {
            path.is_file()
                && path
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().to_lowercase() == wanted)
        })
}
