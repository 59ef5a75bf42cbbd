//! A loaded set of source files.

use super::MediaScanner;
use crate::core::media::MediaFile;
use crate::core::metadata::CaptureDateExtractor;
use crate::error::RepositoryError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Outcome of checking every file in a batch for a usable capture date
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub total: usize,
    pub processed: usize,
    pub with_errors: usize,
    /// One message per file whose date could not be extracted
    pub messages: Vec<String>,
}

/// Source files ready to import, each with its capture date already read
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    root: Option<PathBuf>,
    files: Vec<MediaFile>,
}

impl SourceBatch {
    /// Scan `root` and open every file found
    pub fn scan(scanner: &dyn MediaScanner, root: &Path) -> Result<Self, RepositoryError> {
        let scan = scanner.scan(root)?;
        let mut batch = Self::from_paths(&scan.paths)?;
        batch.root = Some(root.to_path_buf());
        info!(
            root = %root.display(),
            files = batch.len(),
            with_errors = batch.files_with_date_error().len(),
            "source loaded"
        );
        Ok(batch)
    }

    /// Open each path, choosing extractors by extension
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self, RepositoryError> {
        let files = paths
            .iter()
            .map(MediaFile::open)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { root: None, files })
    }

    /// Open each path with one extractor for every file
    pub fn from_paths_with<P: AsRef<Path>>(
        paths: &[P],
        extractor: &dyn CaptureDateExtractor,
    ) -> Result<Self, RepositoryError> {
        let files = paths
            .iter()
            .map(|p| MediaFile::with_extractor(p, extractor))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { root: None, files })
    }

    /// Directory the batch was scanned from, if any
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn files(&self) -> &[MediaFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files_with_date_error(&self) -> Vec<&MediaFile> {
        self.files.iter().filter(|f| f.has_date_error()).collect()
    }

    /// Number of files per extension, as spelled on disk
    pub fn describe(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for file in &self.files {
            *counts.entry(file.extension().to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of files per containing directory
    pub fn describe_paths(&self) -> BTreeMap<PathBuf, usize> {
        let mut counts = BTreeMap::new();
        for file in &self.files {
            *counts.entry(file.directory().to_path_buf()).or_insert(0) += 1;
        }
        counts
    }

    /// Files sharing a base name with another file in the batch, by name.
    ///
    /// These would collide in one destination folder under the strict
    /// policy.
    pub fn duplicate_names(&self) -> BTreeMap<String, Vec<PathBuf>> {
        let mut by_name: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        for file in &self.files {
            by_name
                .entry(file.basename().to_string())
                .or_default()
                .push(file.path().to_path_buf());
        }
        by_name.retain(|_, paths| paths.len() > 1);
        by_name
    }

    pub fn check(&self) -> CheckReport {
        let mut report = CheckReport {
            total: self.files.len(),
            ..CheckReport::default()
        };
        for file in &self.files {
            report.processed += 1;
            if let Some(message) = file.date_error_message() {
                report.with_errors += 1;
                report.messages.push(message);
            }
        }
        report
    }
}
