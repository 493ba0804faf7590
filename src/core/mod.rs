//! # Core Module
//!
//! The GUI-agnostic organizing and duplicate-clustering engine.
//!
//! ## Modules
//! - `walker` - breadth-first directory tree enumeration
//! - `source` - filtered, lazy photo entry sources
//! - `metadata` - per-format metadata capabilities and their registry
//! - `copier` - date-bucketed copying with collision resolution
//! - `duplicates` - bucket-and-merge duplicate clustering

pub mod copier;
pub mod duplicates;
pub mod metadata;
pub mod source;
pub mod walker;

// Re-export commonly used types
pub use copier::{CopyEngine, CopyReport, CopyRequest, SkipReason, DEFAULT_DATE_TEMPLATE};
pub use duplicates::{CandidateGroup, DuplicateFinder};
pub use metadata::{MetadataProvider, MetadataRegistry, PhotoMetadata};
pub use source::{DirectorySource, Entry, PhotoSource};
pub use walker::{FileNode, TreeWalker};
