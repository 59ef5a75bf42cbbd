//! Destination resolvers.
//!
//! A resolver turns a repository root and a media file into the absolute
//! directory the file is copied into. Resolution is recomputed on every
//! call; nothing is cached, since the directory may not exist yet.

use crate::core::media::{CaptureDate, MediaFile};
use crate::error::{ImportError, RepositoryError};
use chrono::Datelike;
use std::path::{Component, Path, PathBuf};

/// How the destination directory is chosen for an insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// `<root>/<YYYY>/<MM>` from the file's capture date
    YearMonth,
    /// `<root>/<relative path>`, independent of metadata
    Fixed(PathBuf),
}

impl Destination {
    /// Build a destination from an optional caller-supplied path.
    ///
    /// `None` selects [`Destination::YearMonth`]. A supplied path must be
    /// relative and may not climb out of the repository with `..`.
    pub fn from_option(dest: Option<&Path>) -> Result<Self, RepositoryError> {
        match dest {
            None => Ok(Destination::YearMonth),
            Some(path) => {
                let escapes = path
                    .components()
                    .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
                if escapes {
                    return Err(RepositoryError::InvalidDestination {
                        path: path.to_path_buf(),
                    });
                }
                Ok(Destination::Fixed(path.to_path_buf()))
            }
        }
    }

    /// Absolute destination directory for `file`
    pub fn resolve(&self, root: &Path, file: &MediaFile) -> Result<PathBuf, ImportError> {
        match self {
            Destination::YearMonth => match file.capture() {
                CaptureDate::Extracted(date) => Ok(root
                    .join(format!("{:04}", date.year()))
                    .join(format!("{:02}", date.month()))),
                CaptureDate::Failed(e) => Err(ImportError::Metadata(e.clone())),
            },
            Destination::Fixed(relative) => Ok(root.join(relative)),
        }
    }
}
