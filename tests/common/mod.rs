//! Byte-level media fixtures shared by the integration tests.

#![allow(dead_code)]

/// 2020-05-01T10:00:00Z in QuickTime seconds (since 1904-01-01)
pub const RAW_2020_05_01: u32 = 3_671_172_000;

/// Minimal JPEG carrying only an EXIF DateTimeOriginal tag
pub fn jpeg_with_date(date: &str) -> Vec<u8> {
    let mut value = date.as_bytes().to_vec();
    value.push(0);

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&8u32.to_le_bytes());
    // IFD0: ExifIFDPointer -> 26
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x8769u16.to_le_bytes());
    tiff.extend_from_slice(&4u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&26u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());
    // Exif IFD: DateTimeOriginal -> 44
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x9003u16.to_le_bytes());
    tiff.extend_from_slice(&2u16.to_le_bytes());
    tiff.extend_from_slice(&(value.len() as u32).to_le_bytes());
    tiff.extend_from_slice(&44u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());
    tiff.extend_from_slice(&value);

    let mut segment = b"Exif\0\0".to_vec();
    segment.extend_from_slice(&tiff);

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    jpeg.extend_from_slice(&((segment.len() + 2) as u16).to_be_bytes());
    jpeg.extend_from_slice(&segment);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

fn atom(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(payload);
    out
}

/// `ftyp` + `mdat` + `moov(mvhd v0)`
pub fn movie_with_creation(raw_creation: u32) -> Vec<u8> {
    let mut mvhd = vec![0, 0, 0, 0];
    mvhd.extend_from_slice(&raw_creation.to_be_bytes());
    mvhd.extend_from_slice(&raw_creation.to_be_bytes());
    mvhd.extend_from_slice(&600u32.to_be_bytes());
    mvhd.extend_from_slice(&0u32.to_be_bytes());

    let mut file = atom(b"ftyp", b"isom\0\0\0\0isom");
    file.extend(atom(b"mdat", &[0u8; 32]));
    file.extend(atom(b"moov", &atom(b"mvhd", &mvhd)));
    file
}
