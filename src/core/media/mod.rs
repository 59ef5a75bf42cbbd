//! # Media Module
//!
//! One source file offered to the repository.
//!
//! The capture date is extracted exactly once, when the file is opened,
//! and the outcome (date or error) is kept for the lifetime of the value.
//! Asking again never touches the file.

use crate::core::index::ContentFingerprint;
use crate::core::metadata::{extractor_for_extension, CaptureDateExtractor};
use crate::error::{MetadataError, RepositoryError};
use chrono::NaiveDateTime;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Outcome of capture-date extraction, fixed at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureDate {
    Extracted(NaiveDateTime),
    Failed(MetadataError),
}

/// A file to be inserted into the repository
#[derive(Debug, Clone)]
pub struct MediaFile {
    path: PathBuf,
    basename: String,
    extension: String,
    capture: CaptureDate,
    extractor: Option<&'static str>,
}

impl MediaFile {
    /// Open a file, choosing the date extractor from its extension
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = Self::checked_path(path.as_ref())?;
        let extension = extension_of(&path);
        let extractor = extractor_for_extension(&extension);
        Ok(Self::build(path, extension, extractor.as_deref()))
    }

    /// Open a file with an explicit date extractor
    pub fn with_extractor(
        path: impl AsRef<Path>,
        extractor: &dyn CaptureDateExtractor,
    ) -> Result<Self, RepositoryError> {
        let path = Self::checked_path(path.as_ref())?;
        let extension = extension_of(&path);
        Ok(Self::build(path, extension, Some(extractor)))
    }

    fn checked_path(path: &Path) -> Result<PathBuf, RepositoryError> {
        if !path.is_file() {
            return Err(RepositoryError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }
        std::path::absolute(path).map_err(|_| RepositoryError::SourceNotFound {
            path: path.to_path_buf(),
        })
    }

    fn build(
        path: PathBuf,
        extension: String,
        extractor: Option<&dyn CaptureDateExtractor>,
    ) -> Self {
        let capture = match extractor {
            Some(extractor) => match extractor.extract(&path) {
                Ok(date) => CaptureDate::Extracted(date),
                Err(e) => CaptureDate::Failed(e),
            },
            None => CaptureDate::Failed(MetadataError::UnsupportedType {
                path: path.clone(),
                extension: extension.clone(),
            }),
        };

        if let CaptureDate::Failed(ref e) = capture {
            debug!(path = %path.display(), error = %e, "capture date unavailable");
        }

        let basename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            path,
            basename,
            extension,
            capture,
            extractor: extractor.map(|e| e.name()),
        }
    }

    /// Absolute source path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the file
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }

    /// File name including extension
    pub fn basename(&self) -> &str {
        &self.basename
    }

    /// File name without extension
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Extension without the leading dot, as written on disk
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Name of the extractor used, `None` for unsupported types
    pub fn extractor_name(&self) -> Option<&'static str> {
        self.extractor
    }

    pub fn capture(&self) -> &CaptureDate {
        &self.capture
    }

    /// The memoized capture date
    pub fn capture_date(&self) -> Result<NaiveDateTime, MetadataError> {
        match &self.capture {
            CaptureDate::Extracted(date) => Ok(*date),
            CaptureDate::Failed(e) => Err(e.clone()),
        }
    }

    pub fn has_date_error(&self) -> bool {
        matches!(self.capture, CaptureDate::Failed(_))
    }

    pub fn date_error_message(&self) -> Option<String> {
        match &self.capture {
            CaptureDate::Failed(e) => Some(e.to_string()),
            CaptureDate::Extracted(_) => None,
        }
    }

    /// Fingerprint of the full file content
    pub fn fingerprint(&self) -> io::Result<ContentFingerprint> {
        ContentFingerprint::of_file(&self.path)
    }
}

impl fmt::Display for MediaFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::{jpeg_fixtures, movie_fixtures, FilenameExtractor};
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn may_day() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn identity_accessors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("IMG_0004.JPG");
        fs::write(&path, jpeg_fixtures::jpeg_with_date("2020:05:01 10:00:00")).unwrap();

        let file = MediaFile::open(&path).unwrap();

        assert_eq!(file.basename(), "IMG_0004.JPG");
        assert_eq!(file.stem(), "IMG_0004");
        assert_eq!(file.extension(), "JPG");
        assert_eq!(file.directory(), dir.path());
        assert!(file.path().is_absolute());
        assert_eq!(file.extractor_name(), Some("exif"));
    }

    #[test]
    fn jpg_capture_date_comes_from_exif() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.jpg");
        fs::write(&path, jpeg_fixtures::jpeg_with_date("2020:05:01 10:00:00")).unwrap();

        let file = MediaFile::open(&path).unwrap();
        assert_eq!(file.capture_date().unwrap(), may_day());
        assert!(!file.has_date_error());
        assert!(file.date_error_message().is_none());
    }

    #[test]
    fn movie_capture_date_comes_from_container() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        fs::write(&path, movie_fixtures::movie_with_creation(3_671_172_000)).unwrap();

        let file = MediaFile::open(&path).unwrap();
        assert_eq!(file.capture_date().unwrap(), may_day());
    }

    #[test]
    fn capture_date_is_memoized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.jpg");
        fs::write(&path, jpeg_fixtures::jpeg_with_date("2020:05:01 10:00:00")).unwrap();

        let file = MediaFile::open(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(file.capture_date().unwrap(), may_day());
    }

    #[test]
    fn failure_is_memoized_too() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.jpg");
        fs::write(&path, jpeg_fixtures::jpeg_without_exif()).unwrap();

        let file = MediaFile::open(&path).unwrap();
        fs::write(&path, jpeg_fixtures::jpeg_with_date("2020:05:01 10:00:00")).unwrap();

        assert!(file.has_date_error());
        assert!(matches!(
            file.capture_date(),
            Err(MetadataError::MissingTags { .. })
        ));
    }

    #[test]
    fn unsupported_type_has_no_extractor() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"hello").unwrap();

        let file = MediaFile::open(&path).unwrap();
        assert_eq!(file.extractor_name(), None);
        let err = file.capture_date().unwrap_err();
        assert!(matches!(err, MetadataError::UnsupportedType { .. }));
        assert!(file
            .date_error_message()
            .unwrap()
            .contains("no extractor for this type"));
    }

    #[test]
    fn explicit_filename_extractor() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("2020-05-01 10.00.00.png");
        fs::write(&path, b"png bytes").unwrap();

        let file = MediaFile::with_extractor(&path, &FilenameExtractor::default()).unwrap();
        assert_eq!(file.capture_date().unwrap(), may_day());
        assert_eq!(file.extractor_name(), Some("filename"));
    }

    #[test]
    fn missing_source_is_rejected() {
        let result = MediaFile::open("/nonexistent/photo.jpg");
        assert!(matches!(result, Err(RepositoryError::SourceNotFound { .. })));
    }

    #[test]
    fn directory_is_not_a_media_file() {
        let dir = TempDir::new().unwrap();
        let result = MediaFile::open(dir.path());
        assert!(matches!(result, Err(RepositoryError::SourceNotFound { .. })));
    }
}
