//! Date inference from file names.

use super::CaptureDateExtractor;
use crate::error::{MetadataError, RepositoryError};
use chrono::NaiveDateTime;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Dropbox camera upload naming, e.g. `2016-08-23 14.23.15`
pub const DEFAULT_NAME_PATTERN: &str = r"\d{4}-\d{2}-\d{2}\s\d{2}\.\d{2}\.\d{2}";
/// chrono format matching [`DEFAULT_NAME_PATTERN`]
pub const DEFAULT_NAME_FORMAT: &str = "%Y-%m-%d %H.%M.%S";

static DEFAULT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(DEFAULT_NAME_PATTERN).unwrap());

/// Finds a date in the file stem with a regex and parses it with a chrono format
#[derive(Debug, Clone)]
pub struct FilenameExtractor {
    pattern: Regex,
    format: String,
}

impl FilenameExtractor {
    /// Build an extractor from a custom pattern and format
    pub fn new(pattern: &str, format: &str) -> Result<Self, RepositoryError> {
        let pattern = Regex::new(pattern)
            .map_err(|e| RepositoryError::Config(format!("invalid name pattern: {}", e)))?;
        Ok(Self {
            pattern,
            format: format.to_string(),
        })
    }

    /// Date encoded in `stem`, if the pattern matches and parses
    pub fn date_from_stem(&self, stem: &str) -> Option<NaiveDateTime> {
        let found = self.pattern.find(stem)?;
        NaiveDateTime::parse_from_str(found.as_str(), &self.format).ok()
    }
}

impl Default for FilenameExtractor {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_RE.clone(),
            format: DEFAULT_NAME_FORMAT.to_string(),
        }
    }
}

impl CaptureDateExtractor for FilenameExtractor {
    fn name(&self) -> &'static str {
        "filename"
    }

    fn extract(&self, path: &Path) -> Result<NaiveDateTime, MetadataError> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let found = self
            .pattern
            .find(&stem)
            .ok_or_else(|| MetadataError::NoDateInName {
                path: path.to_path_buf(),
            })?;

        NaiveDateTime::parse_from_str(found.as_str(), &self.format).map_err(|_| {
            MetadataError::InvalidTimestamp {
                path: path.to_path_buf(),
                value: found.as_str().to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn default_pattern_reads_camera_upload_names() {
        let date = FilenameExtractor::default()
            .extract(Path::new("/uploads/2016-08-23 14.23.15.jpg"))
            .unwrap();
        assert_eq!(date, at(2016, 8, 23, 14, 23, 15));
    }

    #[test]
    fn match_may_be_surrounded_by_other_text() {
        let date = FilenameExtractor::default()
            .date_from_stem("trip 2016-08-23 14.23.15 (1)")
            .unwrap();
        assert_eq!(date, at(2016, 8, 23, 14, 23, 15));
    }

    #[test]
    fn extension_is_not_part_of_the_match() {
        let err = FilenameExtractor::default()
            .extract(Path::new("/uploads/IMG_0001.2016-08-23 14.23.15"))
            .unwrap_err();
        assert!(matches!(err, MetadataError::NoDateInName { .. }));
    }

    #[test]
    fn no_match_is_an_error() {
        let err = FilenameExtractor::default()
            .extract(Path::new("/uploads/IMG_0001.jpg"))
            .unwrap_err();
        assert!(matches!(err, MetadataError::NoDateInName { .. }));
    }

    #[test]
    fn impossible_date_is_invalid() {
        let err = FilenameExtractor::default()
            .extract(Path::new("/uploads/2016-13-45 14.23.15.jpg"))
            .unwrap_err();
        assert!(matches!(err, MetadataError::InvalidTimestamp { .. }));
    }

    #[test]
    fn custom_pattern_and_format() {
        let extractor = FilenameExtractor::new(r"\d{8}_\d{6}", "%Y%m%d_%H%M%S").unwrap();
        let date = extractor
            .extract(Path::new("IMG_20190509_154733.jpg"))
            .unwrap();
        assert_eq!(date, at(2019, 5, 9, 15, 47, 33));
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        assert!(matches!(
            FilenameExtractor::new("(", DEFAULT_NAME_FORMAT),
            Err(RepositoryError::Config(_))
        ));
    }
}
