//! # Core Module
//!
//! The import engine, independent of any front end.
//!
//! ## Modules
//! - `media` - A source file and its memoized capture date
//! - `metadata` - Capture-date extractors (EXIF, QuickTime, file name)
//! - `scanner` - Finds source files and loads them into a batch
//! - `destination` - Chooses the directory a file goes to
//! - `importer` - Collision policies and the copy step
//! - `index` - Content fingerprints and the duplicate index
//! - `repository` - The repository and its configuration
//! - `pipeline` - Batch insert and its report
//! - `journal` - SQLite record of past imports

pub mod destination;
pub mod importer;
pub mod index;
pub mod journal;
pub mod media;
pub mod metadata;
pub mod pipeline;
pub mod repository;
pub mod scanner;

// Re-export commonly used types
pub use destination::Destination;
pub use importer::{CollisionPolicy, ImportedFile};
pub use index::{ContentFingerprint, ContentIndex};
pub use journal::ImportJournal;
pub use media::{CaptureDate, MediaFile};
pub use metadata::CaptureDateExtractor;
pub use pipeline::{ImportOutcome, ImportPipeline, ImportReport};
pub use repository::{InsertOptions, Repository, RepositoryConfig};
pub use scanner::{CheckReport, ScanConfig, SourceBatch, SourceScanner};
