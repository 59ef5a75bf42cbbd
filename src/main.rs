//! # media-repo CLI
//!
//! Command-line interface for the media repository.
//!
//! ## Usage
//! ```bash
//! media-repo import /media/card --repo ~/Pictures/repo --unlocked
//! media-repo check /media/card --exclude-ext thm
//! ```

mod cli;

use media_repository::Result;

fn main() -> Result<()> {
    cli::run()
}
