//! # Events Module
//!
//! Progress reporting for long-running repository operations.
//!
//! ## Design
//! The core library emits events through a channel so a front end
//! (the CLI, or anything else) can render progress without the core
//! knowing about terminals.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Import(ImportEvent::FileImported { destination, .. }) = event {
//!             println!("-> {}", destination.display());
//!         }
//!     }
//! });
//!
//! pipeline.insert_strict_with_events(&files, false, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
