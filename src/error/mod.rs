//! # Error Module
//!
//! User-friendly error types for the photo archiver.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Fail fast on misuse** - configuration errors (iterating an unfrozen
//!   source, registering a directory as a duplicate candidate) surface
//!   immediately and are never swallowed
//! - **Skip, don't abort** - transient I/O problems affect one entry only

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum PhotoArchiverError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Copy error: {0}")]
    Copy(#[from] CopyError),

    #[error("Duplicate scan error: {0}")]
    Duplicate(#[from] DuplicateError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised by photo sources and the tree walker
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Cannot set extensions after the source has been frozen")]
    AlreadyFrozen,

    #[error("The source must be frozen before obtaining entries")]
    NotFrozen,

    #[error("The walk is exhausted, there are no more entries")]
    Exhausted,

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the copy engine
#[derive(Error, Debug)]
pub enum CopyError {
    #[error("Invalid date bucket template: {template}")]
    InvalidTemplate { template: String },

    #[error("Failed to prepare target root {path}: {source}")]
    TargetRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while registering duplicate candidates
#[derive(Error, Debug)]
pub enum DuplicateError {
    #[error("Duplicate candidate must be a regular file: {path}")]
    NotARegularFile { path: PathBuf },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, PhotoArchiverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_error_mentions_freeze() {
        let message = SourceError::AlreadyFrozen.to_string();
        assert!(message.contains("frozen"));
    }

    #[test]
    fn duplicate_error_includes_path() {
        let error = DuplicateError::NotARegularFile {
            path: PathBuf::from("/photos/vacation"),
        };
        let message = error.to_string();
        assert!(message.contains("/photos/vacation"));
    }

    #[test]
    fn copy_error_includes_template() {
        let error = CopyError::InvalidTemplate {
            template: "%Q".to_string(),
        };
        assert!(error.to_string().contains("%Q"));
    }
}
