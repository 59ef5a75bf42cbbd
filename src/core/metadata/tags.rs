//! EXIF tag reader for still images.

use super::CaptureDateExtractor;
use crate::error::MetadataError;
use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Layout of EXIF date/time values
pub const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Reads `DateTimeOriginal` (tag 36867) from the image's EXIF block
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifExtractor;

impl CaptureDateExtractor for ExifExtractor {
    fn name(&self) -> &'static str {
        "exif"
    }

    fn extract(&self, path: &Path) -> Result<NaiveDateTime, MetadataError> {
        let file = File::open(path).map_err(|e| MetadataError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut reader = BufReader::new(file);

        let exif = Reader::new()
            .read_from_container(&mut reader)
            .map_err(|e| match e {
                exif::Error::Io(io) => MetadataError::Open {
                    path: path.to_path_buf(),
                    reason: io.to_string(),
                },
                other => MetadataError::MissingTags {
                    path: path.to_path_buf(),
                    reason: other.to_string(),
                },
            })?;

        if exif.fields().next().is_none() {
            return Err(MetadataError::MissingTags {
                path: path.to_path_buf(),
                reason: "empty EXIF data".to_string(),
            });
        }

        let field = exif
            .get_field(Tag::DateTimeOriginal, In::PRIMARY)
            .ok_or_else(|| MetadataError::MissingCaptureTag {
                path: path.to_path_buf(),
            })?;

        let raw = ascii_value(&field.value).unwrap_or_else(|| field.display_value().to_string());

        parse_exif_datetime(&raw).ok_or_else(|| MetadataError::InvalidTimestamp {
            path: path.to_path_buf(),
            value: raw,
        })
    }
}

fn ascii_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        if let Some(bytes) = vec.first() {
            if let Ok(s) = std::str::from_utf8(bytes) {
                return Some(s.trim_end_matches('\0').trim().to_string());
            }
        }
    }
    None
}

/// Strict `YYYY:MM:DD HH:MM:SS`
pub(crate) fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, EXIF_DATE_FORMAT).ok()
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Byte-level JPEG builders for tests.

    /// Little-endian TIFF block: IFD0 -> Exif IFD -> DateTimeOriginal
    fn tiff_with_date(date: &str) -> Vec<u8> {
        let mut value = date.as_bytes().to_vec();
        value.push(0);
        let count = value.len() as u32;

        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"II");
        tiff.extend_from_slice(&42u16.to_le_bytes());
        tiff.extend_from_slice(&8u32.to_le_bytes());

        // IFD0 at 8: one entry, ExifIFDPointer -> 26
        tiff.extend_from_slice(&1u16.to_le_bytes());
        tiff.extend_from_slice(&0x8769u16.to_le_bytes());
        tiff.extend_from_slice(&4u16.to_le_bytes());
        tiff.extend_from_slice(&1u32.to_le_bytes());
        tiff.extend_from_slice(&26u32.to_le_bytes());
        tiff.extend_from_slice(&0u32.to_le_bytes());

        // Exif IFD at 26: one entry, DateTimeOriginal (ASCII) -> 44
        tiff.extend_from_slice(&1u16.to_le_bytes());
        tiff.extend_from_slice(&0x9003u16.to_le_bytes());
        tiff.extend_from_slice(&2u16.to_le_bytes());
        tiff.extend_from_slice(&count.to_le_bytes());
        tiff.extend_from_slice(&44u32.to_le_bytes());
        tiff.extend_from_slice(&0u32.to_le_bytes());

        tiff.extend_from_slice(&value);
        tiff
    }

    /// Minimal JPEG whose only segment is an APP1 EXIF block
    pub fn jpeg_with_date(date: &str) -> Vec<u8> {
        let mut segment = b"Exif\0\0".to_vec();
        segment.extend_from_slice(&tiff_with_date(date));

        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
        jpeg.extend_from_slice(&((segment.len() + 2) as u16).to_be_bytes());
        jpeg.extend_from_slice(&segment);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        jpeg
    }

    /// JPEG without any EXIF segment
    pub fn jpeg_without_exif() -> Vec<u8> {
        vec![0xFF, 0xD8, 0xFF, 0xD9]
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn reads_date_time_original() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "img_0004.jpg", &jpeg_with_date("2020:05:01 10:00:00"));

        let date = ExifExtractor.extract(&path).unwrap();

        let expected = NaiveDate::from_ymd_opt(2020, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(date, expected);
    }

    #[test]
    fn jpeg_without_exif_is_missing_tags() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "plain.jpg", &jpeg_without_exif());

        let err = ExifExtractor.extract(&path).unwrap_err();
        assert!(matches!(err, MetadataError::MissingTags { .. }));
    }

    #[test]
    fn garbage_is_missing_tags() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "broken.jpg", b"this is not a valid image file");

        let err = ExifExtractor.extract(&path).unwrap_err();
        assert!(matches!(err, MetadataError::MissingTags { .. }));
    }

    #[test]
    fn unparsable_date_is_invalid_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "odd.jpg", &jpeg_with_date("2020-05-01 10:00:00"));

        let err = ExifExtractor.extract(&path).unwrap_err();
        match err {
            MetadataError::InvalidTimestamp { value, .. } => {
                assert_eq!(value, "2020-05-01 10:00:00");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_open_error() {
        let err = ExifExtractor
            .extract(Path::new("/nonexistent/file.jpg"))
            .unwrap_err();
        assert!(matches!(err, MetadataError::Open { .. }));
    }

    #[test]
    fn parse_exif_datetime_is_strict() {
        assert!(parse_exif_datetime("2016:08:23 14:23:15").is_some());
        assert!(parse_exif_datetime("2016:08:23").is_none());
        assert!(parse_exif_datetime("    :  :     :  :  ").is_none());
    }
}
