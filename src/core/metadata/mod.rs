//! # Metadata Module
//!
//! Capture-date extraction.
//!
//! ## Extractors
//! - `ExifExtractor` - `DateTimeOriginal` tag of still images
//! - `QuickTimeExtractor` - `mvhd` creation time of QuickTime/MP4 video
//! - `FilenameExtractor` - date embedded in the file name
//!   (e.g. Dropbox camera uploads, `2016-08-23 14.23.15.jpg`)
//!
//! Selection is by extension only: `.jpg` uses EXIF, `.mov`/`.mp4` use
//! the container parser, everything else has no extractor. The filename
//! extractor is never picked automatically; pass it explicitly to
//! [`MediaFile::with_extractor`](crate::core::media::MediaFile::with_extractor).

mod filename;
mod quicktime;
mod tags;

pub use filename::{FilenameExtractor, DEFAULT_NAME_FORMAT, DEFAULT_NAME_PATTERN};
pub use quicktime::{creation_timestamp, ContainerError, QuickTimeExtractor, QUICKTIME_EPOCH_OFFSET};
pub use tags::{ExifExtractor, EXIF_DATE_FORMAT};

#[cfg(test)]
pub(crate) use quicktime::fixtures as movie_fixtures;
#[cfg(test)]
pub(crate) use tags::fixtures as jpeg_fixtures;

use crate::error::MetadataError;
use chrono::NaiveDateTime;
use std::path::Path;

/// A strategy that reads the capture date of one file
pub trait CaptureDateExtractor: Send + Sync {
    /// Short name used in logs and reports
    fn name(&self) -> &'static str;

    /// Produce the capture timestamp of the file at `path`, or say why not.
    ///
    /// Implementations release every handle they open before returning.
    fn extract(&self, path: &Path) -> Result<NaiveDateTime, MetadataError>;
}

/// Pick the extractor for a file extension (case-insensitive, without the dot)
pub fn extractor_for_extension(extension: &str) -> Option<Box<dyn CaptureDateExtractor>> {
    match extension.to_lowercase().as_str() {
        "jpg" => Some(Box::new(ExifExtractor)),
        "mov" | "mp4" => Some(Box::new(QuickTimeExtractor)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpg_uses_exif() {
        assert_eq!(extractor_for_extension("jpg").unwrap().name(), "exif");
        assert_eq!(extractor_for_extension("JPG").unwrap().name(), "exif");
    }

    #[test]
    fn movies_use_container_parser() {
        assert_eq!(extractor_for_extension("mov").unwrap().name(), "quicktime");
        assert_eq!(extractor_for_extension("MP4").unwrap().name(), "quicktime");
    }

    #[test]
    fn other_extensions_have_no_extractor() {
        assert!(extractor_for_extension("txt").is_none());
        assert!(extractor_for_extension("png").is_none());
        assert!(extractor_for_extension("").is_none());
    }
}
