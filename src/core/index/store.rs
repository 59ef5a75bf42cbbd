//! On-disk format of the content index.
//!
//! A single JSON document:
//!
//! ```json
//! { "version": 1, "entries": [ { "fingerprint": "<sha256 hex>", "path": "/abs/path" } ] }
//! ```
//!
//! A path that is not valid UTF-8 is stored as its raw bytes in hex,
//! `"path": { "raw_hex": "..." }`, so every path round-trips exactly.
//!
//! Entries are written sorted by fingerprint. The file is written to a
//! sibling temp file first and renamed into place.

use super::{ContentFingerprint, ContentIndex};
use crate::error::IndexError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct IndexDocument {
    version: u32,
    entries: Vec<IndexRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexRecord {
    fingerprint: ContentFingerprint,
    path: StoredPath,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredPath {
    Text(String),
    Raw { raw_hex: String },
}

impl StoredPath {
    fn encode(path: &Path) -> Result<Self, String> {
        if let Some(text) = path.to_str() {
            return Ok(StoredPath::Text(text.to_string()));
        }
        raw_bytes(path)
            .map(|bytes| StoredPath::Raw {
                raw_hex: hex::encode(bytes),
            })
            .ok_or_else(|| format!("path is not valid UTF-8: {}", path.display()))
    }

    fn decode(self) -> Result<PathBuf, String> {
        match self {
            StoredPath::Text(text) => Ok(PathBuf::from(text)),
            StoredPath::Raw { raw_hex } => {
                let bytes = hex::decode(&raw_hex)
                    .map_err(|e| format!("invalid raw path '{}': {}", raw_hex, e))?;
                path_from_raw(bytes)
                    .ok_or_else(|| "raw paths are not supported on this platform".to_string())
            }
        }
    }
}

#[cfg(unix)]
fn raw_bytes(path: &Path) -> Option<Vec<u8>> {
    use std::os::unix::ffi::OsStrExt;
    Some(path.as_os_str().as_bytes().to_vec())
}

#[cfg(not(unix))]
fn raw_bytes(_path: &Path) -> Option<Vec<u8>> {
    None
}

#[cfg(unix)]
fn path_from_raw(bytes: Vec<u8>) -> Option<PathBuf> {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;
    Some(PathBuf::from(OsString::from_vec(bytes)))
}

#[cfg(not(unix))]
fn path_from_raw(_bytes: Vec<u8>) -> Option<PathBuf> {
    None
}

pub(super) fn save(index: &ContentIndex, path: &Path) -> Result<(), IndexError> {
    let save_err = |reason: String| IndexError::Save {
        path: path.to_path_buf(),
        reason,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| save_err(e.to_string()))?;
    }

    let mut entries = index
        .iter()
        .map(|(fingerprint, path)| {
            Ok(IndexRecord {
                fingerprint: *fingerprint,
                path: StoredPath::encode(path)?,
            })
        })
        .collect::<Result<Vec<_>, String>>()
        .map_err(save_err)?;
    entries.sort_by(|a, b| a.fingerprint.cmp(&b.fingerprint));

    let document = IndexDocument {
        version: FORMAT_VERSION,
        entries,
    };
    let json = serde_json::to_vec_pretty(&document).map_err(|e| save_err(e.to_string()))?;

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    fs::write(&temp_path, json).map_err(|e| save_err(e.to_string()))?;
    fs::rename(&temp_path, path).map_err(|e| save_err(e.to_string()))?;

    info!(path = %path.display(), entries = index.len(), "content index saved");
    Ok(())
}

pub(super) fn load(path: &Path) -> Result<ContentIndex, IndexError> {
    let load_err = |reason: String| IndexError::Load {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = fs::read(path).map_err(|e| load_err(e.to_string()))?;
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(load_err("index file is empty".to_string()));
    }

    let document: IndexDocument =
        serde_json::from_slice(&bytes).map_err(|e| load_err(e.to_string()))?;
    if document.version != FORMAT_VERSION {
        return Err(load_err(format!(
            "unsupported index version {}",
            document.version
        )));
    }

    let mut entries = HashMap::with_capacity(document.entries.len());
    for record in document.entries {
        let stored = record.path.decode().map_err(load_err)?;
        if let Some(previous) = entries.insert(record.fingerprint, stored) {
            return Err(load_err(format!(
                "fingerprint {} appears twice (first at {})",
                record.fingerprint,
                previous.display()
            )));
        }
    }

    info!(path = %path.display(), entries = entries.len(), "content index loaded");
    Ok(ContentIndex::from_entries(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_paths_are_stored_as_plain_strings() {
        let stored = StoredPath::encode(Path::new("/repo/2020/05/a.jpg")).unwrap();
        assert_eq!(stored, StoredPath::Text("/repo/2020/05/a.jpg".to_string()));

        let json = serde_json::to_string(&stored).unwrap();
        assert_eq!(json, "\"/repo/2020/05/a.jpg\"");
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_path_survives_save_and_load() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::TempDir::new().unwrap();
        let odd = dir.path().join(OsStr::from_bytes(b"IMG_\xff.jpg"));
        let fingerprint = ContentFingerprint::of_bytes(b"odd name");

        let mut entries = HashMap::new();
        entries.insert(fingerprint, odd.clone());
        let index = ContentIndex::from_entries(entries);

        let file = dir.path().join("repo.index.json");
        save(&index, &file).unwrap();
        let text = fs::read_to_string(&file).unwrap();
        assert!(text.contains("raw_hex"));

        let loaded = load(&file).unwrap();
        assert_eq!(loaded, index);
        assert_eq!(loaded.lookup(&fingerprint), Some(odd.as_path()));
    }

    #[test]
    fn malformed_raw_path_is_a_load_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("repo.index.json");
        let fingerprint = ContentFingerprint::of_bytes(b"x");
        let json = format!(
            r#"{{"version":1,"entries":[{{"fingerprint":"{}","path":{{"raw_hex":"zz"}}}}]}}"#,
            fingerprint.to_hex()
        );
        fs::write(&file, json).unwrap();

        assert!(matches!(load(&file), Err(IndexError::Load { .. })));
    }
}
