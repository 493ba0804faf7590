//! # Source Module
//!
//! Turns a location into an ordered, lazily-evaluated sequence of processable
//! photo entries.
//!
//! A source goes through two phases: configurable, then frozen. Extension
//! filters may only be set before [`PhotoSource::freeze`] is called, and
//! entries can only be obtained afterwards. The entry sequence is finite and
//! not restartable - asking for entries a second time re-walks the filesystem
//! and reflects its state at that moment, not a cached snapshot.

use crate::core::walker::TreeWalker;
use crate::error::SourceError;
use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::PathBuf;

/// One photo or video item exposed by a source
///
/// The content handle is opened lazily, when the entry is yielded, so a scan
/// over a large tree never holds more than one file open. It is closed when
/// the entry is dropped, whether the content was read or not.
pub struct Entry {
    name: String,
    fallback: Option<DateTime<Utc>>,
    path: PathBuf,
    content: File,
}

impl Entry {
    /// File name without any path information, for example `IMG_01429.JPG`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fallback date for when the photo file itself carries no usable date
    ///
    /// Re-reads the file's modification timestamp, which can be expensive on
    /// some platforms, so this is only computed when actually called. Falls
    /// back to the cheap timestamp captured when the entry was discovered.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        match fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(modified) => Some(DateTime::from(modified)),
            Err(_) => self.fallback,
        }
    }
}

impl Read for Entry {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.content.read(buf)
    }
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// A configurable-then-frozen supplier of photo entries
///
/// Implement this to plug in sources other than a local directory tree.
pub trait PhotoSource: Send {
    /// Human-readable identification of the location
    fn location(&self) -> &str;

    /// Restrict the source to file names ending (case-insensitively) in one
    /// of the given extensions
    ///
    /// Only legal before [`PhotoSource::freeze`]; afterwards this fails with
    /// [`SourceError::AlreadyFrozen`]. Without a filter, every file passes.
    fn set_extensions(&mut self, extensions: Vec<String>) -> Result<(), SourceError>;

    /// Lock the configuration. Idempotent.
    fn freeze(&mut self);

    /// The lazy entry sequence
    ///
    /// Fails with [`SourceError::NotFrozen`] if the source was never frozen.
    fn entries(&self) -> Result<Box<dyn Iterator<Item = Entry> + Send>, SourceError>;
}

/// A photo source backed by a local directory tree
///
/// Entries are yielded in [`TreeWalker`] order; directories are filtered out.
pub struct DirectorySource {
    location: String,
    extensions: Option<Vec<String>>,
    frozen: bool,
}

impl DirectorySource {
    /// Create a source rooted at the given directory
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            extensions: None,
            frozen: false,
        }
    }
}

impl PhotoSource for DirectorySource {
    fn location(&self) -> &str {
        &self.location
    }

    fn set_extensions(&mut self, extensions: Vec<String>) -> Result<(), SourceError> {
        if self.frozen {
            return Err(SourceError::AlreadyFrozen);
        }
        self.extensions = Some(
            extensions
                .into_iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
        );
        Ok(())
    }

    fn freeze(&mut self) {
        self.frozen = true;
    }

    fn entries(&self) -> Result<Box<dyn Iterator<Item = Entry> + Send>, SourceError> {
        if !self.frozen {
            return Err(SourceError::NotFrozen);
        }
        Ok(Box::new(Entries {
            walker: TreeWalker::new(&self.location),
            extensions: self.extensions.clone(),
        }))
    }
}

impl std::fmt::Display for DirectorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.location)
    }
}

struct Entries {
    walker: TreeWalker,
    extensions: Option<Vec<String>>,
}

impl Entries {
    fn matches(&self, name: &str) -> bool {
        match &self.extensions {
            None => true,
            Some(extensions) => {
                let lower = name.to_lowercase();
                extensions.iter().any(|ext| lower.ends_with(ext))
            }
        }
    }
}

impl Iterator for Entries {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        loop {
            let node = self.walker.next()?;
            if node.is_dir {
                continue;
            }

            let name = match node.path.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => continue,
            };
            if !self.matches(&name) {
                continue;
            }

            // Open lazily, here and not during the walk, so at most one file
            // handle is live at a time.
            match File::open(&node.path) {
                Ok(content) => {
                    return Some(Entry {
                        name,
                        fallback: node.modified.map(DateTime::from),
                        path: node.path,
                        content,
                    });
                }
                Err(e) => {
                    tracing::warn!(path = %node.path.display(), error = %e, "skipping unreadable file");
                    continue;
                }
            }
        }
    }
}
