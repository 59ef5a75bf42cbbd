//! Per-file outcomes and the batch report built from them.

use crate::core::importer::ImportedFile;
use crate::error::{FailureKind, RepoError};
use crate::events::ImportSummary;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Outcome of one file in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportOutcome {
    Imported(ImportedFile),
    Failed {
        source: PathBuf,
        kind: FailureKind,
        cause: String,
    },
}

impl ImportOutcome {
    pub(crate) fn failed(source: &Path, error: &RepoError) -> Self {
        ImportOutcome::Failed {
            source: source.to_path_buf(),
            kind: error.failure_kind(),
            cause: error.to_string(),
        }
    }

    pub fn source(&self) -> &Path {
        match self {
            ImportOutcome::Imported(file) => &file.source,
            ImportOutcome::Failed { source, .. } => source,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ImportOutcome::Imported(_))
    }
}

/// Result of a batch insert
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    /// Id shared with the journal rows of this batch
    pub batch_id: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures_by_kind: BTreeMap<FailureKind, usize>,
    pub dry_run: bool,
    pub duration_ms: u64,
    pub outcomes: Vec<ImportOutcome>,
}

impl ImportReport {
    pub fn new(
        batch_id: String,
        outcomes: Vec<ImportOutcome>,
        dry_run: bool,
        duration_ms: u64,
    ) -> Self {
        let mut failures_by_kind = BTreeMap::new();
        for outcome in &outcomes {
            if let ImportOutcome::Failed { kind, .. } = outcome {
                *failures_by_kind.entry(*kind).or_insert(0) += 1;
            }
        }
        let failed = failures_by_kind.values().sum();

        Self {
            batch_id,
            total: outcomes.len(),
            succeeded: outcomes.len() - failed,
            failed,
            failures_by_kind,
            dry_run,
            duration_ms,
            outcomes,
        }
    }

    /// Files that were placed (or planned, on a dry run)
    pub fn successes(&self) -> Vec<&ImportedFile> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                ImportOutcome::Imported(file) => Some(file),
                ImportOutcome::Failed { .. } => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<&ImportOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success()).collect()
    }

    /// `(source, cause)` for every failed file
    pub fn failure_causes(&self) -> Vec<(&Path, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                ImportOutcome::Failed { source, cause, .. } => {
                    Some((source.as_path(), cause.as_str()))
                }
                ImportOutcome::Imported(_) => None,
            })
            .collect()
    }

    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            total: self.total,
            succeeded: self.succeeded,
            failed: self.failed,
            dry_run: self.dry_run,
            duration_ms: self.duration_ms,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
