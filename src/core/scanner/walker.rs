//! Directory walking implementation using walkdir.

use super::{filter::SourceFilter, MediaScanner, ScanIssue, ScanResult};
use crate::error::RepositoryError;
use regex::Regex;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Configuration for the source scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Descend into subdirectories
    pub recursive: bool,
    /// Lower-case file names before filtering
    pub lowercase_names: bool,
    /// Regex searched in the full path of each file
    pub include_pattern: Option<String>,
    /// Extensions to skip (case-insensitive, with or without the dot)
    pub exclude_extensions: Vec<String>,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
}

impl ScanConfig {
    /// Recursive scan with no filtering beyond hidden files
    pub fn recursive() -> Self {
        Self {
            recursive: true,
            ..Self::default()
        }
    }
}

/// Scanner implementation using the walkdir crate
#[derive(Debug, Clone)]
pub struct SourceScanner {
    config: ScanConfig,
    filter: SourceFilter,
}

impl SourceScanner {
    /// Create a scanner; an invalid include pattern is a configuration error
    pub fn new(config: ScanConfig) -> Result<Self, RepositoryError> {
        let mut filter = SourceFilter::new()
            .with_hidden(config.include_hidden)
            .with_lowercase_names(config.lowercase_names)
            .with_excluded_extensions(&config.exclude_extensions);

        if let Some(pattern) = &config.include_pattern {
            let regex = Regex::new(pattern)
                .map_err(|e| RepositoryError::Config(format!("include pattern: {}", e)))?;
            filter = filter.with_pattern(regex);
        }

        Ok(Self { config, filter })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    fn is_hidden_dir(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && !self.filter.includes_hidden()
            && entry.file_name().to_string_lossy().starts_with('.')
    }
}

impl MediaScanner for SourceScanner {
    fn scan(&self, root: &Path) -> Result<ScanResult, RepositoryError> {
        if !root.is_dir() {
            return Err(RepositoryError::InvalidRoot {
                path: root.to_path_buf(),
                reason: "source is not a directory".to_string(),
            });
        }
        let root = std::path::absolute(root).map_err(|e| RepositoryError::InvalidRoot {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut walker = WalkDir::new(&root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();
        if !self.config.recursive {
            walker = walker.max_depth(1);
        }

        let mut result = ScanResult::default();
        for entry in walker.into_iter().filter_entry(|e| !self.is_hidden_dir(e)) {
            match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    if self.filter.should_include(entry.path()) {
                        result.paths.push(entry.into_path());
                    } else {
                        debug!(path = %entry.path().display(), "filtered out");
                    }
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                    warn!(path = %path.display(), error = %e, "unreadable entry skipped");
                    result.errors.push(ScanIssue {
                        path,
                        message: e.to_string(),
                    });
                }
            }
        }

        debug!(
            root = %root.display(),
            files = result.paths.len(),
            errors = result.errors.len(),
            "source scan complete"
        );
        Ok(result)
    }
}
