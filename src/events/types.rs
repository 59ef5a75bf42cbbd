//! Event type definitions for progress reporting.

use crate::error::FailureKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Batch import events
    Import(ImportEvent),
    /// Content index events
    Index(IndexEvent),
}

/// Events during a batch import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ImportEvent {
    /// Batch started
    Started { total_files: usize },
    /// A file was copied (or would have been, on a dry run)
    FileImported {
        source: PathBuf,
        destination: PathBuf,
        dry_run: bool,
    },
    /// A file failed; the batch continues
    FileFailed {
        source: PathBuf,
        kind: FailureKind,
        message: String,
    },
    /// Batch finished
    Completed { summary: ImportSummary },
}

/// Events while scanning a repository into the content index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IndexEvent {
    /// Scan started
    Started { root: PathBuf },
    /// One more file fingerprinted
    FileIndexed { path: PathBuf, indexed: usize },
    /// Scan finished
    Completed { entries: usize },
}

/// Counts reported when a batch completes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub dry_run: bool,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Import(ImportEvent::FileFailed {
            source: PathBuf::from("/incoming/notes.txt"),
            kind: FailureKind::UnsupportedType,
            message: "no extractor for this type".to_string(),
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("unsupported_type"));

        match serde_json::from_str::<Event>(&json).unwrap() {
            Event::Import(ImportEvent::FileFailed { kind, .. }) => {
                assert_eq!(kind, FailureKind::UnsupportedType);
            }
            _ => panic!("Wrong event type"),
        }
    }
}
