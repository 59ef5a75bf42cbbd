//! QuickTime / MP4 container parser.
//!
//! Walks the top-level boxes until `moov`, then reads the creation time
//! from the `mvhd` box that must open it.

use super::CaptureDateExtractor;
use crate::error::MetadataError;
use chrono::{DateTime, NaiveDateTime};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Seconds between 1904-01-01T00:00:00Z and 1970-01-01T00:00:00Z
pub const QUICKTIME_EPOCH_OFFSET: i64 = 2_082_844_800;

const BOX_HEADER_SIZE: u64 = 8;

/// Reads the `mvhd` creation time of `.mov` / `.mp4` files
#[derive(Debug, Clone, Copy, Default)]
pub struct QuickTimeExtractor;

impl CaptureDateExtractor for QuickTimeExtractor {
    fn name(&self) -> &'static str {
        "quicktime"
    }

    fn extract(&self, path: &Path) -> Result<NaiveDateTime, MetadataError> {
        let file = File::open(path).map_err(|e| MetadataError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut reader = BufReader::new(file);

        let seconds = creation_timestamp(&mut reader).map_err(|e| e.attribute(path))?;

        DateTime::from_timestamp(seconds, 0)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| MetadataError::InvalidTimestamp {
                path: path.to_path_buf(),
                value: seconds.to_string(),
            })
    }
}

/// Failure while walking the box structure, before a path is attached
#[derive(Debug)]
pub enum ContainerError {
    MovieBoxNotFound,
    Compressed,
    UnexpectedBox(String),
    Malformed(String),
}

impl ContainerError {
    fn attribute(self, path: &Path) -> MetadataError {
        let path = path.to_path_buf();
        match self {
            ContainerError::MovieBoxNotFound => MetadataError::MovieBoxNotFound { path },
            ContainerError::Compressed => MetadataError::CompressedMovie { path },
            ContainerError::UnexpectedBox(found) => MetadataError::UnexpectedBox { path, found },
            ContainerError::Malformed(reason) => MetadataError::Malformed { path, reason },
        }
    }
}

impl From<io::Error> for ContainerError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ContainerError::Malformed("truncated box".to_string())
        } else {
            ContainerError::Malformed(err.to_string())
        }
    }
}

struct BoxHeader {
    size: u32,
    kind: [u8; 4],
}

impl BoxHeader {
    fn kind_str(&self) -> String {
        String::from_utf8_lossy(&self.kind).into_owned()
    }
}

/// Read an 8-byte box header; `None` at a clean or partial end of input
fn read_header<R: Read>(reader: &mut R) -> io::Result<Option<BoxHeader>> {
    let mut buf = [0u8; BOX_HEADER_SIZE as usize];
    match reader.read_exact(&mut buf) {
        Ok(()) => Ok(Some(BoxHeader {
            size: u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
            kind: [buf[4], buf[5], buf[6], buf[7]],
        })),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e),
    }
}

fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

/// Creation time of the movie, in seconds since the Unix epoch (UTC).
///
/// Reaching end of input before `moov` is `MovieBoxNotFound`; a
/// compressed movie header (`cmov`) and any first child other than
/// `mvhd` are rejected.
pub fn creation_timestamp<R: Read + Seek>(reader: &mut R) -> Result<i64, ContainerError> {
    loop {
        let header = read_header(reader)?.ok_or(ContainerError::MovieBoxNotFound)?;
        if &header.kind == b"moov" {
            if header.size == 1 {
                // 64-bit largesize sits between the header and the first child
                read_u64(reader)?;
            }
            break;
        }

        let skip = match header.size {
            // Box runs to end of file, so nothing follows it
            0 => return Err(ContainerError::MovieBoxNotFound),
            1 => read_u64(reader)?.checked_sub(2 * BOX_HEADER_SIZE).ok_or_else(|| {
                ContainerError::Malformed(format!(
                    "'{}' extended size smaller than its header",
                    header.kind_str()
                ))
            })?,
            n if u64::from(n) < BOX_HEADER_SIZE => {
                return Err(ContainerError::Malformed(format!(
                    "'{}' size {} smaller than its header",
                    header.kind_str(),
                    n
                )))
            }
            n => u64::from(n) - BOX_HEADER_SIZE,
        };

        let offset = i64::try_from(skip)
            .map_err(|_| ContainerError::Malformed(format!("box size {} out of range", skip)))?;
        reader.seek(SeekFrom::Current(offset))?;
    }

    let header = read_header(reader)?
        .ok_or_else(|| ContainerError::Malformed("'moov' box is empty".to_string()))?;
    match &header.kind {
        b"cmov" => return Err(ContainerError::Compressed),
        b"mvhd" => {}
        _ => return Err(ContainerError::UnexpectedBox(header.kind_str())),
    }

    let version_flags = read_u32(reader)?;
    let raw = if version_flags >> 24 == 1 {
        read_u64(reader)?
    } else {
        u64::from(read_u32(reader)?)
    };

    let raw = i64::try_from(raw)
        .map_err(|_| ContainerError::Malformed(format!("creation time {} out of range", raw)))?;
    Ok(raw - QUICKTIME_EPOCH_OFFSET)
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Byte-level QuickTime builders for tests.

    pub fn atom(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(kind);
        out.extend_from_slice(payload);
        out
    }

    pub fn mvhd_v0(raw_creation: u32) -> Vec<u8> {
        let mut payload = vec![0, 0, 0, 0];
        payload.extend_from_slice(&raw_creation.to_be_bytes());
        // modification time, timescale, duration
        payload.extend_from_slice(&raw_creation.to_be_bytes());
        payload.extend_from_slice(&600u32.to_be_bytes());
        payload.extend_from_slice(&0u32.to_be_bytes());
        atom(b"mvhd", &payload)
    }

    /// `ftyp` + `mdat` + `moov(mvhd)`, the usual camera layout
    pub fn movie_with_creation(raw_creation: u32) -> Vec<u8> {
        let mut file = atom(b"ftyp", b"qt  \0\0\0\0qt  ");
        file.extend(atom(b"mdat", &[0u8; 32]));
        file.extend(atom(b"moov", &mvhd_v0(raw_creation)));
        file
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use chrono::NaiveDate;
    use std::io::Cursor;

    // 2020-05-01T10:00:00Z in QuickTime seconds
    const RAW_2020_05_01: u32 = 3_671_172_000;

    fn parse(bytes: Vec<u8>) -> Result<i64, ContainerError> {
        creation_timestamp(&mut Cursor::new(bytes))
    }

    #[test]
    fn reads_creation_time_after_skipping_boxes() {
        let seconds = parse(movie_with_creation(RAW_2020_05_01)).unwrap();
        assert_eq!(seconds, RAW_2020_05_01 as i64 - QUICKTIME_EPOCH_OFFSET);
        assert_eq!(seconds, 1_588_327_200);
    }

    #[test]
    fn extractor_converts_to_utc() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("clip.mov");
        std::fs::write(&path, movie_with_creation(RAW_2020_05_01)).unwrap();

        let date = QuickTimeExtractor.extract(&path).unwrap();
        let expected = NaiveDate::from_ymd_opt(2020, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(date, expected);
    }

    #[test]
    fn raw_zero_predates_unix_epoch() {
        let seconds = parse(movie_with_creation(0)).unwrap();
        assert_eq!(seconds, -QUICKTIME_EPOCH_OFFSET);
    }

    #[test]
    fn missing_moov_is_not_found() {
        let mut file = atom(b"ftyp", b"isom");
        file.extend(atom(b"mdat", &[1, 2, 3]));
        assert!(matches!(parse(file), Err(ContainerError::MovieBoxNotFound)));
    }

    #[test]
    fn empty_input_is_not_found() {
        assert!(matches!(parse(Vec::new()), Err(ContainerError::MovieBoxNotFound)));
    }

    #[test]
    fn compressed_movie_is_rejected() {
        let file = atom(b"moov", &atom(b"cmov", &[0u8; 16]));
        assert!(matches!(parse(file), Err(ContainerError::Compressed)));
    }

    #[test]
    fn unexpected_first_child_is_rejected() {
        let file = atom(b"moov", &atom(b"trak", &[0u8; 16]));
        match parse(file) {
            Err(ContainerError::UnexpectedBox(kind)) => assert_eq!(kind, "trak"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn truncated_mvhd_is_malformed() {
        let mut file = 24u32.to_be_bytes().to_vec();
        file.extend_from_slice(b"moov");
        file.extend_from_slice(&16u32.to_be_bytes());
        file.extend_from_slice(b"mvhd");
        file.extend_from_slice(&[0, 0]);
        assert!(matches!(parse(file), Err(ContainerError::Malformed(_))));
    }

    #[test]
    fn undersized_box_is_malformed() {
        let mut file = 4u32.to_be_bytes().to_vec();
        file.extend_from_slice(b"free");
        file.extend(atom(b"moov", &mvhd_v0(RAW_2020_05_01)));
        assert!(matches!(parse(file), Err(ContainerError::Malformed(_))));
    }

    #[test]
    fn extended_size_box_is_skipped() {
        let mut file = 1u32.to_be_bytes().to_vec();
        file.extend_from_slice(b"mdat");
        file.extend_from_slice(&24u64.to_be_bytes());
        file.extend_from_slice(&[0u8; 8]);
        file.extend(atom(b"moov", &mvhd_v0(RAW_2020_05_01)));

        assert_eq!(parse(file).unwrap(), 1_588_327_200);
    }

    #[test]
    fn extended_size_movie_box_is_entered() {
        let mvhd = mvhd_v0(RAW_2020_05_01);
        let mut file = atom(b"ftyp", b"isom");
        file.extend_from_slice(&1u32.to_be_bytes());
        file.extend_from_slice(b"moov");
        file.extend_from_slice(&(16 + mvhd.len() as u64).to_be_bytes());
        file.extend(mvhd);

        assert_eq!(parse(file).unwrap(), 1_588_327_200);
    }

    #[test]
    fn version_one_header_uses_64_bit_time() {
        let mut payload = vec![1, 0, 0, 0];
        payload.extend_from_slice(&(RAW_2020_05_01 as u64).to_be_bytes());
        payload.extend_from_slice(&(RAW_2020_05_01 as u64).to_be_bytes());
        let file = atom(b"moov", &atom(b"mvhd", &payload));

        assert_eq!(parse(file).unwrap(), 1_588_327_200);
    }

    #[test]
    fn extractor_attributes_errors_to_the_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.mp4");
        std::fs::write(&path, atom(b"ftyp", b"isom")).unwrap();

        let err = QuickTimeExtractor.extract(&path).unwrap_err();
        assert!(matches!(err, MetadataError::MovieBoxNotFound { .. }));
        assert_eq!(err.path(), &path);
    }
}
