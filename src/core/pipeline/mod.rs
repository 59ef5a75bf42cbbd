//! # Pipeline Module
//!
//! Batch import on top of [`Repository::insert`](crate::core::repository::Repository::insert).
//!
//! ## Per file
//! 1. **Insert** - duplicate check, destination, collision policy, copy
//! 2. **Record** - outcome into the report, the transaction log, and the
//!    journal when one is attached
//!
//! Failures are captured per file; the report groups them by kind.

mod executor;
mod report;

pub use executor::ImportPipeline;
pub use report::{ImportOutcome, ImportReport};
