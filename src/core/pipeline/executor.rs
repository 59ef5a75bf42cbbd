//! Batch import execution.

use super::report::{ImportOutcome, ImportReport};
use crate::core::destination::Destination;
use crate::core::journal::{EntryStatus, ImportJournal, JournalEntry};
use crate::core::media::MediaFile;
use crate::core::repository::{InsertOptions, Repository};
use crate::error::{RepositoryError, Result};
use crate::events::{null_sender, Event, EventSender, ImportEvent};
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, warn};

/// Runs single-file inserts over a whole batch.
///
/// A failing file is recorded in the report and the batch moves on.
/// Usage errors (bad flags, a repository without a valid root) are
/// checked before the first file and abort the call.
pub struct ImportPipeline<'a> {
    repository: &'a Repository,
    journal: Option<&'a ImportJournal>,
}

impl<'a> ImportPipeline<'a> {
    pub fn new(repository: &'a Repository) -> Self {
        Self {
            repository,
            journal: None,
        }
    }

    /// Record every outcome in `journal`
    pub fn with_journal(mut self, journal: &'a ImportJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Insert every file by capture date, failing on any name collision
    pub fn insert_strict(&self, files: &[MediaFile], dry_run: bool) -> Result<ImportReport> {
        self.insert_strict_with_events(files, dry_run, &null_sender())
    }

    pub fn insert_strict_with_events(
        &self,
        files: &[MediaFile],
        dry_run: bool,
        events: &EventSender,
    ) -> Result<ImportReport> {
        self.insert_batch_with_events(files, None, InsertOptions::strict(dry_run), events)
    }

    /// Insert every file with the given destination and flags
    pub fn insert_batch(
        &self,
        files: &[MediaFile],
        dest: Option<&Path>,
        options: InsertOptions,
    ) -> Result<ImportReport> {
        self.insert_batch_with_events(files, dest, options, &null_sender())
    }

    pub fn insert_batch_with_events(
        &self,
        files: &[MediaFile],
        dest: Option<&Path>,
        options: InsertOptions,
        events: &EventSender,
    ) -> Result<ImportReport> {
        if !self.repository.is_valid() {
            return Err(RepositoryError::NotInitialized.into());
        }
        options.policy()?;
        Destination::from_option(dest)?;

        let start_time = Instant::now();
        let batch_id = ImportJournal::generate_batch_id();
        info!(
            batch = %batch_id,
            files = files.len(),
            dry_run = options.dry_run,
            "import started"
        );
        events.send(Event::Import(ImportEvent::Started {
            total_files: files.len(),
        }));

        let mut outcomes = Vec::with_capacity(files.len());
        for file in files {
            let outcome = self.insert_one(file, dest, options, events);
            self.journal_outcome(&batch_id, &outcome);
            outcomes.push(outcome);
        }

        let report = ImportReport::new(
            batch_id,
            outcomes,
            options.dry_run,
            start_time.elapsed().as_millis() as u64,
        );
        info!(
            batch = %report.batch_id,
            succeeded = report.succeeded,
            failed = report.failed,
            "import finished"
        );
        events.send(Event::Import(ImportEvent::Completed {
            summary: report.summary(),
        }));
        Ok(report)
    }

    /// Insert one file, capturing any failure as its outcome.
    ///
    /// A root that vanishes mid-batch fails the remaining files as usage
    /// errors instead of discarding the files already copied.
    fn insert_one(
        &self,
        file: &MediaFile,
        dest: Option<&Path>,
        options: InsertOptions,
        events: &EventSender,
    ) -> ImportOutcome {
        match self.repository.insert(file, dest, options) {
            Ok(imported) => {
                info!(target: "transactions", "Insert OK {}", file);
                events.send(Event::Import(ImportEvent::FileImported {
                    source: imported.source.clone(),
                    destination: imported.destination.clone(),
                    dry_run: imported.dry_run,
                }));
                ImportOutcome::Imported(imported)
            }
            Err(e) => {
                error!(target: "transactions", "Insert ERROR {}: {}", file, e);
                events.send(Event::Import(ImportEvent::FileFailed {
                    source: file.path().to_path_buf(),
                    kind: e.failure_kind(),
                    message: e.to_string(),
                }));
                ImportOutcome::failed(file.path(), &e)
            }
        }
    }

    fn journal_outcome(&self, batch_id: &str, outcome: &ImportOutcome) {
        let Some(journal) = self.journal else {
            return;
        };

        let recorded_at = chrono::Utc::now().timestamp();
        let entry = match outcome {
            ImportOutcome::Imported(file) => JournalEntry {
                batch_id: batch_id.to_string(),
                recorded_at,
                source: file.source.clone(),
                destination: Some(file.destination.clone()),
                status: if file.dry_run {
                    EntryStatus::DryRun
                } else {
                    EntryStatus::Imported
                },
                failure_kind: None,
                message: None,
            },
            ImportOutcome::Failed {
                source,
                kind,
                cause,
            } => JournalEntry {
                batch_id: batch_id.to_string(),
                recorded_at,
                source: source.clone(),
                destination: None,
                status: EntryStatus::Failed,
                failure_kind: Some(*kind),
                message: Some(cause.clone()),
            },
        };

        // The copy already happened; a journal failure must not undo the batch.
        if let Err(e) = journal.record(&entry) {
            warn!(batch = %batch_id, error = %e, "could not write journal entry");
        }
    }
}
