//! Integration tests for duplicate clustering.
//!
//! Walks real directory trees through the public API and checks that the
//! resulting clusters match what a reviewer would expect:
//! - Near-simultaneous taken-dates end up in one group
//! - Dateless files fall back to name/size clustering
//! - Files without a metadata provider never appear in any group

use chrono::{DateTime, Utc};
use photo_archiver::core::metadata::{MetadataProvider, MetadataRegistry, PhotoMetadata};
use photo_archiver::core::{DuplicateFinder, TreeWalker};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Reads the taken-date from the first line of the file (RFC 3339)
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

fn write_file(root: &Path, name: &str, content: &str) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Walk a tree and register every regular file as a candidate
fn scan(finder: &DuplicateFinder, root: &Path) {
    for node in TreeWalker::new(root) {
        if !node.is_dir {
            finder.add_candidate(&node.path).unwrap();
        }
    }
}

#[test]
fn scanning_two_trees_finds_cross_tree_duplicates() {
    let originals = TempDir::new().unwrap();
    let backups = TempDir::new().unwrap();
    // Same shot, re-encoded seconds apart
    write_file(originals.path(), "holiday/shot.jpg", "2012-05-30T12:30:05Z");
    write_file(backups.path(), "export/shot_copy.jpg", "2012-05-30T12:30:42Z");
    // Unrelated photo a day later
    write_file(originals.path(), "holiday/other.jpg", "2012-05-31T08:00:00Z");

    let finder = DuplicateFinder::new(test_registry());
    scan(&finder, originals.path());
    scan(&finder, backups.path());

    let groups = finder.into_groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 2);
    assert_eq!(groups[0].duplicate_count(), 1);

    let names: Vec<_> = groups[0]
        .files
        .iter()
        .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert!(names.contains(&"shot.jpg".to_string()));
    assert!(names.contains(&"shot_copy.jpg".to_string()));
}

#[test]
fn dateless_files_fall_back_to_name_and_size() {
    let temp = TempDir::new().unwrap();
    // GIFs carry no taken-date here; equal names cluster regardless of size
    write_file(temp.path(), "logo.gif", "short");
    write_file(temp.path(), "site/logo.gif", "a much longer payload");

    let finder = DuplicateFinder::new(test_registry());
    scan(&finder, temp.path());

    let groups = finder.into_groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 2);
}

#[test]
fn mixed_tree_reports_only_provider_backed_clusters() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "a.jpg", "2012-05-30T12:30:05Z");
    write_file(temp.path(), "sub/b.jpg", "2012-05-30T12:30:55Z");
    // Identical text files: no provider for .txt, so never clustered
    write_file(temp.path(), "readme.txt", "same bytes");
    write_file(temp.path(), "sub/readme.txt", "same bytes");

    let finder = DuplicateFinder::new(test_registry());
    scan(&finder, temp.path());

    let groups = finder.into_groups();
    assert_eq!(groups.len(), 1);
    assert!(groups[0]
        .files
        .iter()
        .all(|f| f.extension().is_some_and(|e| e == "jpg")));
}

#[test]
fn groups_serialize_for_downstream_tooling() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "a.jpg", "2012-05-30T12:30:05Z");
    write_file(temp.path(), "b.jpg", "2012-05-30T12:30:55Z");

    let finder = DuplicateFinder::new(test_registry());
    scan(&finder, temp.path());
    let groups = finder.into_groups();

    let json = serde_json::to_string(&groups).unwrap();
    assert!(json.contains("a.jpg"));
    assert!(json.contains("b.jpg"));
}

#[test]
fn empty_tree_produces_no_groups() {
    let temp = TempDir::new().unwrap();
    let finder = DuplicateFinder::new(test_registry());
    scan(&finder, temp.path());

    assert!(finder.into_groups().is_empty());
}
