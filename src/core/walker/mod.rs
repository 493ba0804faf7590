//! # Walker Module
//!
//! Lazy breadth-first enumeration of a directory tree.
//!
//! All immediate children of the root are yielded (in ascending name order)
//! before any grandchild; each directory discovered at a level is queued FIFO
//! and expanded only after every directory queued before it. A directory node
//! is therefore always yielded before its own contents.
//!
//! Note that this makes the order unsuitable for deleting a tree top-down:
//! collect all nodes and process them in reverse instead.

use crate::error::SourceError;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// One filesystem entry seen during a walk
#[derive(Debug, Clone)]
pub struct FileNode {
    /// Path to the entry
    pub path: PathBuf,
    /// Whether the entry is a directory
    pub is_dir: bool,
    /// Size in bytes (0 for directories on some platforms)
    pub size: u64,
    /// Last modified time, if the platform reports one
    pub modified: Option<SystemTime>,
}

/// Breadth-first directory tree walker
///
/// Memory use is bounded by the queue of not-yet-expanded directories, not by
/// the total size of the tree. An unreadable or vanished directory contributes
/// zero children; the walk itself never fails.
pub struct TreeWalker {
    level: std::vec::IntoIter<FileNode>,
    pending: VecDeque<PathBuf>,
    peeked: Option<FileNode>,
}

impl TreeWalker {
    /// Create a walker over the tree rooted at `root`
    ///
    /// The root directory itself is not yielded, only its descendants.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let mut pending = VecDeque::new();
        pending.push_back(root.into());
        Self {
            level: Vec::new().into_iter(),
            pending,
            peeked: None,
        }
    }

    /// Whether another entry is available
    ///
    /// Idempotent: calling this repeatedly never advances the walk.
    pub fn has_next(&mut self) -> bool {
        if self.peeked.is_none() {
            self.peeked = self.advance();
        }
        self.peeked.is_some()
    }

    /// Next entry, or `SourceError::Exhausted` past the end of the walk
    pub fn try_next(&mut self) -> Result<FileNode, SourceError> {
        self.advance_peeked().ok_or(SourceError::Exhausted)
    }

    fn advance_peeked(&mut self) -> Option<FileNode> {
        if let Some(node) = self.peeked.take() {
            return Some(node);
        }
        self.advance()
    }

    fn advance(&mut self) -> Option<FileNode> {
        loop {
            if let Some(node) = self.level.next() {
                if node.is_dir {
                    self.pending.push_back(node.path.clone());
                }
                return Some(node);
            }

            let dir = self.pending.pop_front()?;
            self.level = list_level(&dir).into_iter();
        }
    }
}

impl Iterator for TreeWalker {
    type Item = FileNode;

    fn next(&mut self) -> Option<FileNode> {
        self.advance_peeked()
    }
}

/// List one directory's children, sorted ascending by name
///
/// A directory that cannot be read (permissions, vanished mid-walk) produces
/// an empty level rather than an error.
fn list_level(dir: &Path) -> Vec<FileNode> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "skipping unreadable directory");
            return Vec::new();
        }
    };

    let mut nodes: Vec<FileNode> = entries
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let metadata = entry.metadata().ok()?;
            Some(FileNode {
                path: entry.path(),
                is_dir: metadata.is_dir(),
                size: metadata.len(),
                modified: metadata.modified().ok(),
            })
        })
        .collect();

    nodes.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    /// root/{a.txt, subdir1/{subsub/{a.txt, b.txt}}, subdir2/{c.txt}}
    fn create_test_tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        File::create(root.join("a.txt")).unwrap();
        fs::create_dir_all(root.join("subdir1/subsub")).unwrap();
        fs::create_dir(root.join("subdir2")).unwrap();
        File::create(root.join("subdir1/subsub/a.txt")).unwrap();
        File::create(root.join("subdir1/subsub/b.txt")).unwrap();
        File::create(root.join("subdir2/c.txt")).unwrap();
        temp_dir
    }

    fn suffixes(nodes: &[FileNode], root: &Path) -> Vec<String> {
        nodes
            .iter()
            .map(|n| {
                n.path
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    #[test]
    fn walk_is_breadth_first_and_name_ordered() {
        let temp_dir = create_test_tree();
        let nodes: Vec<FileNode> = TreeWalker::new(temp_dir.path()).collect();

        assert_eq!(
            suffixes(&nodes, temp_dir.path()),
            vec![
                "a.txt",
                "subdir1",
                "subdir2",
                "subdir1/subsub",
                "subdir2/c.txt",
                "subdir1/subsub/a.txt",
                "subdir1/subsub/b.txt",
            ]
        );
    }

    #[test]
    fn directories_are_yielded_before_their_contents() {
        let temp_dir = create_test_tree();
        let nodes: Vec<FileNode> = TreeWalker::new(temp_dir.path()).collect();

        for (i, node) in nodes.iter().enumerate() {
            if node.is_dir {
                for child in nodes.iter().take(i) {
                    assert!(!child.path.starts_with(&node.path));
                }
            }
        }
    }

    #[test]
    fn has_next_is_idempotent() {
        let temp_dir = create_test_tree();
        let mut walker = TreeWalker::new(temp_dir.path());

        assert!(walker.has_next());
        assert!(walker.has_next());
        assert!(walker.has_next());

        let total = walker.count();
        assert_eq!(total, 7);
    }

    #[test]
    fn try_next_past_exhaustion_errors() {
        let temp_dir = TempDir::new().unwrap();
        File::create(temp_dir.path().join("only.txt")).unwrap();

        let mut walker = TreeWalker::new(temp_dir.path());
        assert!(walker.try_next().is_ok());
        assert!(matches!(walker.try_next(), Err(SourceError::Exhausted)));
        // Still exhausted on repeated calls
        assert!(matches!(walker.try_next(), Err(SourceError::Exhausted)));
        assert!(!walker.has_next());
    }

    #[test]
    fn nonexistent_root_yields_nothing() {
        let mut walker = TreeWalker::new("/nonexistent/path/12345");
        assert!(!walker.has_next());
        assert!(walker.next().is_none());
    }

    #[test]
    fn nodes_carry_size_and_kind() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("data.bin"), b"12345").unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();

        let nodes: Vec<FileNode> = TreeWalker::new(temp_dir.path()).collect();
        let file = nodes.iter().find(|n| !n.is_dir).unwrap();
        let dir = nodes.iter().find(|n| n.is_dir).unwrap();

        assert_eq!(file.size, 5);
        assert!(file.modified.is_some());
        assert!(dir.path.ends_with("sub"));
    }
}
