//! Event type definitions for progress reporting.

use crate::core::copier::SkipReason;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the engines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Copy run events
    Copy(CopyEvent),
    /// Duplicate scan events
    Duplicate(DuplicateEvent),
}

/// Events during a copy run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CopyEvent {
    /// The run has started
    Started { location: String, target: PathBuf },
    /// One entry was copied to its final destination
    EntryCopied { name: String, destination: PathBuf },
    /// One entry was skipped
    EntrySkipped { name: String, reason: SkipReason },
    /// One entry failed; the run continues
    EntryFailed { name: String, message: String },
    /// The run finished
    Completed { copied: usize, skipped: usize },
}

/// Events during a duplicate scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DuplicateEvent {
    /// The scan has started
    Started { paths: Vec<PathBuf> },
    /// One file was registered as a candidate
    CandidateAdded { path: PathBuf },
    /// The scan finished
    Completed { groups: usize },
}
