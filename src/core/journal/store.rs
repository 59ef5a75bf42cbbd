//! Database operations for the import journal.

use super::types::{EntryStatus, JournalEntry};
use crate::error::{FailureKind, JournalError};
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

const SELECT_COLUMNS: &str = "SELECT batch_id, recorded_at, source, destination, status,
                                     failure_kind, message
                              FROM import_journal";

/// SQLite-backed import journal
pub struct ImportJournal {
    conn: Mutex<Connection>,
}

impl ImportJournal {
    /// Open or create the journal database
    pub fn open(path: &Path) -> Result<Self, JournalError> {
        let open_err = |reason: String| JournalError::Open {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| open_err(e.to_string()))?;
        }

        let conn = Connection::open(path).map_err(|e| open_err(e.to_string()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| open_err(e.to_string()))?;
        Self::init(conn).map_err(|e| open_err(e.to_string()))
    }

    /// Journal that lives only as long as the value
    pub fn open_in_memory() -> Result<Self, JournalError> {
        let conn = Connection::open_in_memory().map_err(|e| JournalError::Open {
            path: PathBuf::from(":memory:"),
            reason: e.to_string(),
        })?;
        Self::init(conn).map_err(|e| JournalError::Query(e.to_string()))
    }

    /// Default location under the user's data directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("media-repository").join("journal.db"))
    }

    fn init(conn: Connection) -> rusqlite::Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS import_journal (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                batch_id TEXT NOT NULL,
                recorded_at INTEGER NOT NULL,
                source TEXT NOT NULL,
                destination TEXT,
                status TEXT NOT NULL,
                failure_kind TEXT,
                message TEXT
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_import_journal_batch ON import_journal(batch_id)",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Generate a new batch id
    pub fn generate_batch_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Append one entry
    pub fn record(&self, entry: &JournalEntry) -> Result<(), JournalError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO import_journal
             (batch_id, recorded_at, source, destination, status, failure_kind, message)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                entry.batch_id,
                entry.recorded_at,
                entry.source.to_string_lossy(),
                entry.destination.as_ref().map(|d| d.to_string_lossy().into_owned()),
                entry.status.as_str(),
                entry.failure_kind.map(|k| k.as_str()),
                entry.message,
            ],
        )
        .map_err(query_err)?;
        Ok(())
    }

    /// Every entry of one batch, in insertion order
    pub fn list_batch(&self, batch_id: &str) -> Result<Vec<JournalEntry>, JournalError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("{SELECT_COLUMNS} WHERE batch_id = ? ORDER BY id"))
            .map_err(query_err)?;
        let entries = stmt
            .query_map([batch_id], entry_from_row)
            .map_err(query_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(query_err)?;
        Ok(entries)
    }

    /// Most recent entries first
    pub fn recent(&self, limit: usize) -> Result<Vec<JournalEntry>, JournalError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY id DESC LIMIT ?"))
            .map_err(query_err)?;
        let entries = stmt
            .query_map(params![limit as i64], entry_from_row)
            .map_err(query_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(query_err)?;
        Ok(entries)
    }

    pub fn count(&self) -> Result<usize, JournalError> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM import_journal", [], |row| {
            row.get::<_, i64>(0).map(|v| v as usize)
        })
        .map_err(query_err)
    }

    /// Delete every entry, returning how many there were
    pub fn clear(&self) -> Result<usize, JournalError> {
        let conn = self.lock()?;
        let deleted = conn
            .execute("DELETE FROM import_journal", [])
            .map_err(query_err)?;
        Ok(deleted)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, JournalError> {
        self.conn
            .lock()
            .map_err(|e| JournalError::Query(e.to_string()))
    }
}

fn query_err(e: rusqlite::Error) -> JournalError {
    JournalError::Query(e.to_string())
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<JournalEntry> {
    let status: String = row.get(4)?;
    let kind: Option<String> = row.get(5)?;

    Ok(JournalEntry {
        batch_id: row.get(0)?,
        recorded_at: row.get(1)?,
        source: PathBuf::from(row.get::<_, String>(2)?),
        destination: row.get::<_, Option<String>>(3)?.map(PathBuf::from),
        status: EntryStatus::from_str(&status).unwrap_or(EntryStatus::Failed),
        failure_kind: kind.as_deref().and_then(FailureKind::from_str),
        message: row.get(6)?,
    })
}
