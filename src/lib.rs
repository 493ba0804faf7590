//! # Photo Archiver
//!
//! Organizes photos and videos into a date-structured archive and clusters
//! likely duplicates for manual review.
//!
//! ## Core Philosophy
//! - **Never delete** - duplicate clusters are reported, never acted on
//! - **Best effort** - one broken file never aborts a whole run
//! - **Idempotent** - re-running a copy against the same target copies nothing
//!
//! ## Architecture
//! The library is split into a core engine (GUI-agnostic) and presentation layers:
//! - `core` - the walking, copying and duplicate-clustering engine
//! - `events` - event-driven progress reporting (GUI-ready)
//! - `error` - user-friendly error types

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{PhotoArchiverError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
