//! # Media Repository
//!
//! Imports photos and videos into a directory tree organized by capture
//! date, without losing files to name collisions or duplicate content.
//!
//! ## Core Philosophy
//! - **Never lose a file** - collisions fail or pick a new name, never
//!   silently overwrite
//! - **One copy of each content** - an optional content index rejects
//!   files already in the repository
//! - **Report every file** - a batch records each file's outcome and
//!   carries on
//!
//! ## Architecture
//! The library is split into a core engine and presentation layers:
//! - `core` - Capture dates, destinations, collision policies, index, pipeline
//! - `events` - Event-driven progress reporting
//! - `error` - Error types
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use crate::core::{
    CollisionPolicy, ContentIndex, ImportPipeline, ImportReport, InsertOptions, MediaFile,
    Repository, RepositoryConfig, SourceBatch,
};
pub use error::{RepoError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. `RUST_LOG`
/// overrides `default_level` when set.
pub fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
