//! # Scanner Module
//!
//! Finds candidate source files and loads them into a [`SourceBatch`].
//!
//! ## Options
//! - recursive or top-level only
//! - lower-case file names before matching
//! - include regex, searched in the full path
//! - excluded extensions
//! - hidden files and directories (skipped by default)
//!
//! ## Example
//! ```rust,ignore
//! use media_repository::core::scanner::{ScanConfig, SourceBatch, SourceScanner};
//!
//! let scanner = SourceScanner::new(ScanConfig::recursive())?;
//! let batch = SourceBatch::scan(&scanner, "/media/card".as_ref())?;
//! ```

mod batch;
mod filter;
mod walker;

pub use batch::{CheckReport, SourceBatch};
pub use filter::SourceFilter;
pub use walker::{ScanConfig, SourceScanner};

use crate::error::RepositoryError;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A directory entry the walk could not read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanIssue {
    pub path: PathBuf,
    pub message: String,
}

/// Result of a scan operation
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Files that passed the filter
    pub paths: Vec<PathBuf>,
    /// Unreadable entries (non-fatal)
    pub errors: Vec<ScanIssue>,
}

/// Trait for source scanners
///
/// Implement this trait to feed a batch from somewhere other than a
/// directory walk (e.g., for testing).
pub trait MediaScanner: Send + Sync {
    /// Scan `root` and return the files to import
    fn scan(&self, root: &Path) -> Result<ScanResult, RepositoryError>;
}
