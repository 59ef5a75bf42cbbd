//! File filtering logic for the source scanner.

use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

/// Decides which files found by the walk become source files
#[derive(Debug, Clone, Default)]
pub struct SourceFilter {
    /// Matched against the full path; `None` accepts everything
    include: Option<Regex>,
    /// Lower-case extensions to drop
    excluded: HashSet<String>,
    /// Lower-case file names before matching
    lowercase_names: bool,
    include_hidden: bool,
}

impl SourceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.include = Some(pattern);
        self
    }

    /// Extensions to skip, compared without regard to case
    pub fn with_excluded_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    pub fn with_lowercase_names(mut self, lowercase: bool) -> Self {
        self.lowercase_names = lowercase;
        self
    }

    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    pub fn includes_hidden(&self) -> bool {
        self.include_hidden
    }

    /// Check if a file should be included.
    ///
    /// Lower-casing only changes the text that is matched; the path that
    /// the scanner returns keeps its real spelling.
    pub fn should_include(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };

        if !self.include_hidden && name.starts_with('.') {
            return false;
        }

        let name = if self.lowercase_names {
            name.to_lowercase()
        } else {
            name.into_owned()
        };

        if let Some(ext) = Path::new(&name).extension() {
            if self.excluded.contains(&ext.to_string_lossy().to_lowercase()) {
                return false;
            }
        }

        match &self.include {
            Some(pattern) => {
                let candidate = path.with_file_name(&name);
                pattern.is_match(&candidate.to_string_lossy())
            }
            None => true,
        }
    }
}
