//! # Index Module
//!
//! Persistent mapping from content fingerprint to the first path seen
//! with that content.
//!
//! ## Lifecycle
//! - Built by a full repository scan, or loaded from a saved file
//! - Consulted read-only before each insert to reject duplicate content
//! - Saved on demand
//!
//! A scan that meets the same content twice fails; the half-built index
//! is dropped with the error and must be rebuilt once the duplicate is
//! resolved.

mod fingerprint;
mod store;

pub use fingerprint::ContentFingerprint;

use crate::error::{DuplicateContentError, IndexError};
use crate::events::{null_sender, Event, EventSender, IndexEvent};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Fingerprint -> first-seen absolute path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentIndex {
    entries: HashMap<ContentFingerprint, PathBuf>,
}

impl ContentIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: HashMap<ContentFingerprint, PathBuf>) -> Self {
        Self { entries }
    }

    /// Fingerprint every file under `root`
    pub fn scan(root: &Path) -> Result<Self, IndexError> {
        Self::scan_with_events(root, &null_sender())
    }

    /// Fingerprint every file under `root`, reporting progress
    pub fn scan_with_events(root: &Path, events: &EventSender) -> Result<Self, IndexError> {
        let root = std::path::absolute(root).map_err(|e| IndexError::Read {
            path: root.to_path_buf(),
            source: e,
        })?;
        if !root.is_dir() {
            return Err(IndexError::Read {
                path: root,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            });
        }

        info!(root = %root.display(), "scanning repository into content index");
        events.send(Event::Index(IndexEvent::Started { root: root.clone() }));

        let mut index = Self::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                IndexError::Read {
                    path,
                    source: e.into(),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.into_path();
            let fingerprint = ContentFingerprint::of_file(&path).map_err(|e| IndexError::Read {
                path: path.clone(),
                source: e,
            })?;
            index.insert(fingerprint, path.clone())?;

            events.send(Event::Index(IndexEvent::FileIndexed {
                path,
                indexed: index.len(),
            }));
        }

        info!(entries = index.len(), "content index built");
        events.send(Event::Index(IndexEvent::Completed {
            entries: index.len(),
        }));
        Ok(index)
    }

    /// Record a fingerprint; a fingerprint already present is an error
    pub fn insert(
        &mut self,
        fingerprint: ContentFingerprint,
        path: PathBuf,
    ) -> Result<(), DuplicateContentError> {
        match self.entries.entry(fingerprint) {
            Entry::Occupied(existing) => Err(DuplicateContentError {
                existing: existing.get().clone(),
                candidate: path,
            }),
            Entry::Vacant(slot) => {
                slot.insert(path);
                Ok(())
            }
        }
    }

    /// Path first recorded for this fingerprint
    pub fn lookup(&self, fingerprint: &ContentFingerprint) -> Option<&Path> {
        self.entries.get(fingerprint).map(PathBuf::as_path)
    }

    /// Fingerprint `path` and fail if its content is already indexed.
    ///
    /// Returns the fingerprint when the content is new.
    pub fn check(&self, path: &Path) -> Result<ContentFingerprint, IndexError> {
        let fingerprint = ContentFingerprint::of_file(path).map_err(|e| IndexError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        match self.lookup(&fingerprint) {
            Some(existing) => {
                debug!(
                    candidate = %path.display(),
                    existing = %existing.display(),
                    "duplicate content"
                );
                Err(DuplicateContentError {
                    existing: existing.to_path_buf(),
                    candidate: path.to_path_buf(),
                }
                .into())
            }
            None => Ok(fingerprint),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ContentFingerprint, &Path)> {
        self.entries.iter().map(|(fp, path)| (fp, path.as_path()))
    }

    /// Persist the full mapping to `path`
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        store::save(self, path)
    }

    /// Load a mapping saved by [`ContentIndex::save`]
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        store::load(path)
    }
}
