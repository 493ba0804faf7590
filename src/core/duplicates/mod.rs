//! # Duplicates Module
//!
//! Clusters files that are likely duplicates of each other, for manual
//! review. Nothing here deletes anything.
//!
//! ## How It Works
//! 1. Every candidate file contributes zero or more cheap keys: its taken-date
//!    truncated to the minute when a metadata provider can supply one, or its
//!    lowercase name *and* its byte length when no date is available
//! 2. Files are bucketed per key; a dateless file sits in two buckets at once
//! 3. Buckets sharing at least one file are merged repeatedly until a full
//!    pass makes no change, approximating connected components without
//!    building an explicit graph
//! 4. Only clusters of two or more files are reported
//!
//! The name-or-size fallback is deliberately loose: two same-sized, unrelated
//! files can be pulled into one cluster transitively through a third file
//! sharing one of those keys. Review output accordingly - false positives are
//! possible by design.

use crate::core::metadata::MetadataRegistry;
use crate::error::DuplicateError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// A cheap, comparable key derived from one file
///
/// Recomputed per run, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DuplicateKey {
    /// Taken-date truncated to minute resolution (minutes since the epoch);
    /// shots of the same scene moments apart, or timestamp jitter from
    /// re-encoding, still land in one bucket
    TakenMinute(i64),
    /// Lowercase file name, for files without a usable date
    Name(String),
    /// Exact byte length, for files without a usable date
    Size(u64),
}

/// A cluster of probable duplicates, always two or more files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateGroup {
    /// Unique identifier for this group
    pub id: Uuid,
    /// The clustered files, sorted by path
    pub files: Vec<PathBuf>,
}

impl CandidateGroup {
    /// Number of removable files, assuming one of the group is kept
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }
}

/// Collects candidate files and clusters the probable duplicates
///
/// `add_candidate` may be called from several threads at once; the bucket map
/// is internally synchronized. Consolidation happens in [`Self::into_groups`],
/// which consumes the finder, so population is necessarily complete first.
pub struct DuplicateFinder {
    registry: MetadataRegistry,
    buckets: Mutex<HashMap<DuplicateKey, Vec<PathBuf>>>,
}

impl DuplicateFinder {
    /// Create a finder using the given extension-to-provider mapping
    pub fn new(registry: MetadataRegistry) -> Self {
        Self {
            registry,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Register one regular file as a duplicate candidate
    ///
    /// Files whose extension has no registered metadata provider contribute
    /// no keys and will never appear in any cluster.
    pub fn add_candidate(&self, file: &Path) -> Result<(), DuplicateError> {
        if !file.is_file() {
            return Err(DuplicateError::NotARegularFile {
                path: file.to_path_buf(),
            });
        }

        for key in self.compute_keys(file) {
            let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
            buckets.entry(key).or_default().push(file.to_path_buf());
        }
        Ok(())
    }

    fn compute_keys(&self, file: &Path) -> Vec<DuplicateKey> {
        let name = match file.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return Vec::new(),
        };
        // A dotless name has no extension and can never match a provider
        let extension = match name.rfind('.') {
            Some(idx) => name[idx..].to_lowercase(),
            None => return Vec::new(),
        };
        let Some(provider) = self.registry.lookup(&extension) else {
            return Vec::new();
        };

        let date_taken = provider.metadata(file).and_then(|m| m.date_taken);
        match date_taken {
            Some(taken) => vec![DuplicateKey::TakenMinute(taken.timestamp().div_euclid(60))],
            None => {
                // No taken-date: fall back to name and size as independent keys
                let size = std::fs::metadata(file).map(|m| m.len()).unwrap_or(0);
                vec![
                    DuplicateKey::Name(name.to_lowercase()),
                    DuplicateKey::Size(size),
                ]
            }
        }
    }

    /// Consolidate the buckets and return every cluster of two or more files
    ///
    /// The order of the returned list is unspecified; files within a group
    /// are sorted.
    pub fn into_groups(self) -> Vec<CandidateGroup> {
        let mut buckets = self
            .buckets
            .into_inner()
            .unwrap_or_else(|e| e.into_inner());

        // Keep merging until a full pass changes nothing
        while consolidate(&mut buckets) {}

        buckets
            .into_values()
            .filter(|files| files.len() > 1)
            .map(|mut files| {
                files.sort();
                CandidateGroup {
                    id: Uuid::new_v4(),
                    files,
                }
            })
            .collect()
    }
}

/// One merge pass: fold any bucket that overlaps another into it
///
/// Returns whether anything changed. Merging only ever shrinks the bucket
/// count, so the fixed-point loop terminates; set union is associative and
/// commutative, so the final partition does not depend on scan order.
fn consolidate(buckets: &mut HashMap<DuplicateKey, Vec<PathBuf>>) -> bool {
    let keys: Vec<DuplicateKey> = buckets.keys().cloned().collect();
    let mut changes = false;

    for key in keys {
        let Some(candidate) = buckets.get(&key) else {
            continue; // absorbed earlier in this pass
        };
        if candidate.len() < 2 {
            continue;
        }

        let overlapping = buckets.iter().find_map(|(other_key, other)| {
            if *other_key == key {
                return None;
            }
            let candidate = &buckets[&key];
            candidate
                .iter()
                .any(|f| other.contains(f))
                .then(|| other_key.clone())
        });

        if let Some(target_key) = overlapping {
            let absorbed = buckets.remove(&key).expect("bucket exists");
            let target = buckets.get_mut(&target_key).expect("bucket exists");
            for file in absorbed {
                if !target.contains(&file) {
                    target.push(file);
                }
            }
            changes = true;
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::{MetadataProvider, PhotoMetadata};
    use chrono::{DateTime, Utc};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Parses the first line of the file as an RFC 3339 taken-date
    struct ContentDateProvider;

    impl MetadataProvider for ContentDateProvider {
        fn metadata(&self, file: &Path) -> Option<PhotoMetadata> {
            let text = fs::read_to_string(file).ok()?;
            let date_taken = text
                .lines()
                .next()
                .and_then(|line| DateTime::parse_from_rfc3339(line.trim()).ok())
                .map(|d| d.with_timezone(&Utc));
            Some(PhotoMetadata {
                date_taken,
                ..PhotoMetadata::default()
            })
        }
    }

    fn test_registry() -> MetadataRegistry {
        let mut registry = MetadataRegistry::new();
        let provider = Arc::new(ContentDateProvider);
        registry.register(".jpg", provider.clone());
        registry.register(".gif", provider);
        registry
    }

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn non_regular_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let finder = DuplicateFinder::new(test_registry());

        let result = finder.add_candidate(temp_dir.path());
        assert!(matches!(result, Err(DuplicateError::NotARegularFile { .. })));

        let result = finder.add_candidate(&temp_dir.path().join("nonexistent.jpg"));
        assert!(matches!(result, Err(DuplicateError::NotARegularFile { .. })));
    }

    #[test]
    fn dates_differing_in_seconds_cluster_together() {
        let temp_dir = TempDir::new().unwrap();
        let a = write_file(&temp_dir, "a.jpg", "2012-05-30T12:30:01Z");
        let b = write_file(&temp_dir, "b.jpg", "2012-05-30T12:30:45Z");
        let c = write_file(&temp_dir, "sub/c.jpg", "2012-05-30T12:30:59Z");

        let finder = DuplicateFinder::new(test_registry());
        for path in [&a, &b, &c] {
            finder.add_candidate(path).unwrap();
        }

        let groups = finder.into_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].files.len(), 3);
        assert_eq!(groups[0].duplicate_count(), 2);
    }

    #[test]
    fn distinct_minutes_and_names_never_cluster() {
        let temp_dir = TempDir::new().unwrap();
        let a = write_file(&temp_dir, "a.jpg", "2012-05-30T12:30:00Z");
        let b = write_file(&temp_dir, "b.jpg", "2012-05-30T12:31:00Z\nlonger");

        let finder = DuplicateFinder::new(test_registry());
        finder.add_candidate(&a).unwrap();
        finder.add_candidate(&b).unwrap();

        assert!(finder.into_groups().is_empty());
    }

    #[test]
    fn dateless_files_cluster_by_name_or_size() {
        let temp_dir = TempDir::new().unwrap();
        // Same name, different size and directory
        let a = write_file(&temp_dir, "logo.gif", "payload one");
        let b = write_file(&temp_dir, "sub/logo.gif", "a distinctly longer payload");
        // Same size as `a`, different name: pulled in via the size key
        let c = write_file(&temp_dir, "other.gif", "payload two");

        let finder = DuplicateFinder::new(test_registry());
        for path in [&a, &b, &c] {
            finder.add_candidate(path).unwrap();
        }

        let groups = finder.into_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].files.len(), 3);
    }

    #[test]
    fn files_without_provider_contribute_no_keys() {
        let temp_dir = TempDir::new().unwrap();
        // Identical names and sizes, but .txt has no registered provider
        let a = write_file(&temp_dir, "notes.txt", "same bytes");
        let b = write_file(&temp_dir, "sub/notes.txt", "same bytes");
        // No dot at all: also no keys
        let c = write_file(&temp_dir, "README", "same bytes");

        let finder = DuplicateFinder::new(test_registry());
        for path in [&a, &b, &c] {
            finder.add_candidate(path).unwrap();
        }

        assert!(finder.into_groups().is_empty());
    }

    #[test]
    fn singleton_buckets_are_discarded() {
        let temp_dir = TempDir::new().unwrap();
        let a = write_file(&temp_dir, "alone.jpg", "2012-05-30T12:30:00Z");

        let finder = DuplicateFinder::new(test_registry());
        finder.add_candidate(&a).unwrap();

        assert!(finder.into_groups().is_empty());
    }

    #[test]
    fn disjoint_clusters_stay_separate() {
        let temp_dir = TempDir::new().unwrap();
        let a1 = write_file(&temp_dir, "a1.jpg", "2012-05-30T12:30:01Z");
        let a2 = write_file(&temp_dir, "a2.jpg", "2012-05-30T12:30:59Z\nx");
        let b1 = write_file(&temp_dir, "b1.jpg", "2013-01-01T00:00:01Z");
        let b2 = write_file(&temp_dir, "b2.jpg", "2013-01-01T00:00:59Z\nx");

        let finder = DuplicateFinder::new(test_registry());
        for path in [&a1, &a2, &b1, &b2] {
            finder.add_candidate(path).unwrap();
        }

        let groups = finder.into_groups();
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.files.len() == 2));
    }

    #[test]
    fn population_can_happen_from_multiple_threads() {
        let temp_dir = TempDir::new().unwrap();
        let a = write_file(&temp_dir, "a.jpg", "2012-05-30T12:30:01Z");
        let b = write_file(&temp_dir, "b.jpg", "2012-05-30T12:30:45Z");

        let finder = Arc::new(DuplicateFinder::new(test_registry()));
        let handles: Vec<_> = [a, b]
            .into_iter()
            .map(|path| {
                let finder = finder.clone();
                std::thread::spawn(move || finder.add_candidate(&path).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let finder = Arc::into_inner(finder).unwrap();
        let groups = finder.into_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].files.len(), 2);
    }
}
