//! Types for journal storage.

use crate::error::FailureKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What happened to one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Imported,
    DryRun,
    Failed,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Imported => "imported",
            Self::DryRun => "dry_run",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "imported" => Some(Self::Imported),
            "dry_run" => Some(Self::DryRun),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One journal row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Batch the outcome belongs to
    pub batch_id: String,
    /// Unix timestamp (seconds)
    pub recorded_at: i64,
    pub source: PathBuf,
    /// Where the file went; `None` for failures
    pub destination: Option<PathBuf>,
    pub status: EntryStatus,
    pub failure_kind: Option<FailureKind>,
    pub message: Option<String>,
}
