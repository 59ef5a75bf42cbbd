//! # Error Module
//!
//! Error types for the media repository.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - every per-file error names the file
//! - **Two classes** - usage errors abort the call that raised them,
//!   per-file errors are captured into that file's import outcome

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),
}

impl RepoError {
    /// Whether this error is a usage/configuration error.
    ///
    /// Usage errors propagate immediately. Everything else is attributed
    /// to one file and captured in a batch outcome.
    pub fn is_usage(&self) -> bool {
        matches!(self, RepoError::Repository(_) | RepoError::Journal(_))
    }

    /// Classify a per-file error for batch reporting
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            RepoError::Import(e) => e.failure_kind(),
            RepoError::Index(IndexError::Duplicate(_)) => FailureKind::DuplicateContent,
            RepoError::Index(_) => FailureKind::Io,
            RepoError::Repository(_) | RepoError::Journal(_) => FailureKind::Usage,
        }
    }
}

impl From<MetadataError> for RepoError {
    fn from(err: MetadataError) -> Self {
        RepoError::Import(ImportError::Metadata(err))
    }
}

impl From<DuplicateContentError> for RepoError {
    fn from(err: DuplicateContentError) -> Self {
        RepoError::Index(IndexError::Duplicate(err))
    }
}

/// Capture-date extraction failed for one file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("{path}: no extractor for this type '{extension}'. You can exclude the extension.")]
    UnsupportedType { path: PathBuf, extension: String },

    #[error("{path}: failed to open file: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("{path}: missing EXIF data: {reason}")]
    MissingTags { path: PathBuf, reason: String },

    #[error("{path}: EXIF data does not have an original capture date")]
    MissingCaptureTag { path: PathBuf },

    #[error("{path}: invalid capture date '{value}'")]
    InvalidTimestamp { path: PathBuf, value: String },

    #[error("{path}: 'moov' box not found")]
    MovieBoxNotFound { path: PathBuf },

    #[error("{path}: 'moov' box is compressed")]
    CompressedMovie { path: PathBuf },

    #[error("{path}: expected 'mvhd' box, found '{found}'")]
    UnexpectedBox { path: PathBuf, found: String },

    #[error("{path}: malformed container: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("{path}: can't extract a date from the file name")]
    NoDateInName { path: PathBuf },
}

impl MetadataError {
    /// Path of the file the error is attributed to
    pub fn path(&self) -> &PathBuf {
        match self {
            MetadataError::UnsupportedType { path, .. }
            | MetadataError::Open { path, .. }
            | MetadataError::MissingTags { path, .. }
            | MetadataError::MissingCaptureTag { path }
            | MetadataError::InvalidTimestamp { path, .. }
            | MetadataError::MovieBoxNotFound { path }
            | MetadataError::CompressedMovie { path }
            | MetadataError::UnexpectedBox { path, .. }
            | MetadataError::Malformed { path, .. }
            | MetadataError::NoDateInName { path } => path,
        }
    }
}

/// Errors raised by an import strategy for a single file
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Name collision, file exists: {path}")]
    NameCollision { path: PathBuf },

    #[error("Destination file is an existing directory: {path}")]
    DestinationIsDirectory { path: PathBuf },

    #[error("Overwrite is not permitted, file exists: {path}")]
    OverwriteNotPermitted { path: PathBuf },

    #[error("Repository is locked")]
    RepositoryLocked,

    #[error("{0}")]
    Metadata(#[from] MetadataError),

    #[error("Failed to copy {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ImportError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ImportError::NameCollision { .. } => FailureKind::NameCollision,
            ImportError::DestinationIsDirectory { .. } => FailureKind::DestinationIsDirectory,
            ImportError::OverwriteNotPermitted { .. } => FailureKind::OverwriteNotPermitted,
            ImportError::RepositoryLocked => FailureKind::RepositoryLocked,
            ImportError::Metadata(MetadataError::UnsupportedType { .. }) => {
                FailureKind::UnsupportedType
            }
            ImportError::Metadata(_) => FailureKind::Metadata,
            ImportError::Io { .. } => FailureKind::Io,
        }
    }
}

/// Content fingerprint already present in the index
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Duplicate content: {candidate} has the same content as {existing}")]
pub struct DuplicateContentError {
    /// Path recorded first for this fingerprint
    pub existing: PathBuf,
    /// Path whose content collided
    pub candidate: PathBuf,
}

/// Errors that occur with the content index
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("{0}")]
    Duplicate(#[from] DuplicateContentError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load index from {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("Failed to save index to {path}: {reason}")]
    Save { path: PathBuf, reason: String },
}

/// Usage and configuration errors, raised at call time
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Invalid repository path {path}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    #[error("Repository is not valid. Create a new one or open it at a valid path.")]
    NotInitialized,

    #[error("Repository already has a root at {path}")]
    AlreadyRooted { path: PathBuf },

    #[error("overwrite and alternate_names can't both be set: an alternate name never overwrites")]
    ConflictingPolicy,

    #[error("Destination must be relative to the repository root: {path}")]
    InvalidDestination { path: PathBuf },

    #[error("No content index is attached to the repository")]
    NoIndex,

    #[error("Source file not found or not a file: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur with the import journal
#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Failed to open journal at {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("Journal query failed: {0}")]
    Query(String),
}

/// Failure classification used in batch summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnsupportedType,
    Metadata,
    NameCollision,
    DuplicateContent,
    DestinationIsDirectory,
    OverwriteNotPermitted,
    RepositoryLocked,
    Io,
    Usage,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedType => "unsupported_type",
            Self::Metadata => "metadata",
            Self::NameCollision => "name_collision",
            Self::DuplicateContent => "duplicate_content",
            Self::DestinationIsDirectory => "destination_is_directory",
            Self::OverwriteNotPermitted => "overwrite_not_permitted",
            Self::RepositoryLocked => "repository_locked",
            Self::Io => "io",
            Self::Usage => "usage",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "unsupported_type" => Some(Self::UnsupportedType),
            "metadata" => Some(Self::Metadata),
            "name_collision" => Some(Self::NameCollision),
            "duplicate_content" => Some(Self::DuplicateContent),
            "destination_is_directory" => Some(Self::DestinationIsDirectory),
            "overwrite_not_permitted" => Some(Self::OverwriteNotPermitted),
            "repository_locked" => Some(Self::RepositoryLocked),
            "io" => Some(Self::Io),
            "usage" => Some(Self::Usage),
            _ => None,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::UnsupportedType => "Unsupported type",
            Self::Metadata => "Missing or invalid capture date",
            Self::NameCollision => "Name collision",
            Self::DuplicateContent => "Duplicate content",
            Self::DestinationIsDirectory => "Destination is a directory",
            Self::OverwriteNotPermitted => "Overwrite not permitted",
            Self::RepositoryLocked => "Repository locked",
            Self::Io => "I/O error",
            Self::Usage => "Usage error",
        };
        write!(f, "{}", label)
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, RepoError>;
