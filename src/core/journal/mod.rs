//! # Import Journal Module
//!
//! Durable record of batch imports.
//!
//! ## Features
//! - One row per file outcome, grouped by batch id
//! - Persistent storage using SQLite
//! - Per-batch and most-recent listing
//! - Clear operation

mod store;
mod types;

pub use store::ImportJournal;
pub use types::{EntryStatus, JournalEntry};
