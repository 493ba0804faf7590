//! # Events Module
//!
//! Event-driven progress reporting for long-running copy and duplicate-scan
//! operations.
//!
//! ## Design
//! The core library emits events through channels, allowing any UI
//! (CLI, GUI, web) to subscribe and display progress.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Copy(CopyEvent::EntryCopied { name, .. }) = event {
//!             println!("copied {name}");
//!         }
//!     }
//! });
//!
//! engine.copy_with_events(&source, &request, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
