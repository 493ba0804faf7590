//! # Copier Module
//!
//! Copies entries from a photo source into a date-structured target tree.
//!
//! ## How It Works
//! 1. Each entry is staged to a private temporary file (metadata extraction
//!    needs random access, which the entry's forward-only stream cannot give)
//! 2. The taken-date comes from the metadata provider, falling back to the
//!    entry's file date; entries with no date at all are silently skipped
//! 3. The date, formatted with a strftime-style bucket template, names the
//!    destination subdirectory
//! 4. Name collisions resolve by content size: a same-size file already in
//!    the target means "already copied, skip"; a different size gets a `_N`
//!    suffix inserted before the extension
//!
//! A failure on one entry is recorded and the run continues; re-running the
//! same copy against the same target copies nothing new.

use crate::core::metadata::{MetadataProvider, MetadataRegistry};
use crate::core::source::{Entry, PhotoSource};
use crate::error::{CopyError, Result};
use crate::events::{null_sender, CopyEvent, Event, EventSender};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default date bucket template, e.g. `2012/2012-05-30/`
pub const DEFAULT_DATE_TEMPLATE: &str = "%Y/%Y-%m-%d";

/// What to copy where
#[derive(Debug, Clone)]
pub struct CopyRequest {
    /// Root of the target tree; created if absent
    pub target_root: PathBuf,
    /// strftime-style template producing the relative bucket directory
    pub date_template: String,
    /// Inclusive lower bound of the date window
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound of the date window
    pub to: Option<DateTime<Utc>>,
    /// When present, only entries with these exact names are eligible
    pub selection: Option<HashSet<String>>,
}

impl CopyRequest {
    /// A request with the default bucket template and no window or selection
    pub fn new(target_root: impl Into<PathBuf>) -> Self {
        Self {
            target_root: target_root.into(),
            date_template: DEFAULT_DATE_TEMPLATE.to_string(),
            from: None,
            to: None,
            selection: None,
        }
    }
}

/// Why an entry was not copied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Name starts with the hidden-file marker
    Hidden,
    /// No metadata provider registered for the extension
    NoMetadataProvider,
    /// A selection set was given and the name is not in it
    NotSelected,
    /// Neither the provider nor the file produced a usable date
    NoDate,
    /// Taken-date falls outside the `[from, to)` window
    OutsideDateWindow,
    /// A same-size file already exists at the destination
    AlreadyInTarget,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Hidden => write!(f, "hidden file"),
            SkipReason::NoMetadataProvider => write!(f, "no metadata provider"),
            SkipReason::NotSelected => write!(f, "not selected"),
            SkipReason::NoDate => write!(f, "no date available"),
            SkipReason::OutsideDateWindow => write!(f, "outside date window"),
            SkipReason::AlreadyInTarget => write!(f, "already in target"),
        }
    }
}

/// One successfully copied entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopiedEntry {
    pub name: String,
    /// Final destination path, including any `_N` suffix applied
    pub destination: PathBuf,
}

/// One skipped entry and the reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub name: String,
    pub reason: SkipReason,
}

/// Account of one whole copy run
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CopyReport {
    pub copied: Vec<CopiedEntry>,
    pub skipped: Vec<SkippedEntry>,
    /// Per-entry failures; these never abort the run
    pub errors: Vec<String>,
}

enum EntryOutcome {
    Copied(PathBuf),
    Skipped(SkipReason),
}

/// Copies photo sources into a date-bucketed target tree
pub struct CopyEngine {
    registry: MetadataRegistry,
}

impl CopyEngine {
    /// Create an engine using the given extension-to-provider mapping
    pub fn new(registry: MetadataRegistry) -> Self {
        Self { registry }
    }

    /// Copy every eligible entry of `source` under `request.target_root`
    pub fn copy(&self, source: &dyn PhotoSource, request: &CopyRequest) -> Result<CopyReport> {
        self.copy_with_events(source, request, &null_sender())
    }

    /// Copy with progress reporting via events
    pub fn copy_with_events(
        &self,
        source: &dyn PhotoSource,
        request: &CopyRequest,
        events: &EventSender,
    ) -> Result<CopyReport> {
        let items: Vec<Item<'_>> = StrftimeItems::new(&request.date_template).collect();
        if items.iter().any(|item| matches!(item, Item::Error)) {
            return Err(CopyError::InvalidTemplate {
                template: request.date_template.clone(),
            }
            .into());
        }

        fs::create_dir_all(&request.target_root).map_err(|e| CopyError::TargetRoot {
            path: request.target_root.clone(),
            source: e,
        })?;

        let entries = source.entries()?;

        tracing::info!(
            from = source.location(),
            to = %request.target_root.display(),
            template = %request.date_template,
            "starting copy"
        );
        events.send(Event::Copy(CopyEvent::Started {
            location: source.location().to_string(),
            target: request.target_root.clone(),
        }));

        let mut report = CopyReport::default();
        for mut entry in entries {
            let name = entry.name().to_string();
            let extension = extension_of(&name);

            if name.starts_with('.') {
                record_skip(&mut report, events, &name, SkipReason::Hidden);
                continue;
            }
            let Some(provider) = self.registry.lookup(&extension) else {
                record_skip(&mut report, events, &name, SkipReason::NoMetadataProvider);
                continue;
            };
            if let Some(selection) = &request.selection {
                if !selection.contains(&name) {
                    record_skip(&mut report, events, &name, SkipReason::NotSelected);
                    continue;
                }
            }

            match place_entry(&mut entry, &extension, provider.as_ref(), request, &items) {
                Ok(EntryOutcome::Copied(destination)) => {
                    tracing::info!(name = %name, destination = %destination.display(), "copied");
                    events.send(Event::Copy(CopyEvent::EntryCopied {
                        name: name.clone(),
                        destination: destination.clone(),
                    }));
                    report.copied.push(CopiedEntry { name, destination });
                }
                Ok(EntryOutcome::Skipped(reason)) => {
                    record_skip(&mut report, events, &name, reason);
                }
                Err(e) => {
                    tracing::warn!(name = %name, error = %e, "failed to copy entry");
                    events.send(Event::Copy(CopyEvent::EntryFailed {
                        name: name.clone(),
                        message: e.to_string(),
                    }));
                    report.errors.push(format!("{}: {}", name, e));
                }
            }
        }

        events.send(Event::Copy(CopyEvent::Completed {
            copied: report.copied.len(),
            skipped: report.skipped.len(),
        }));
        Ok(report)
    }
}

fn record_skip(report: &mut CopyReport, events: &EventSender, name: &str, reason: SkipReason) {
    tracing::debug!(name = %name, reason = %reason, "skipping entry");
    events.send(Event::Copy(CopyEvent::EntrySkipped {
        name: name.to_string(),
        reason,
    }));
    report.skipped.push(SkippedEntry {
        name: name.to_string(),
        reason,
    });
}

/// Lowercase extension including the dot; a dotless name is its own extension
fn extension_of(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) => name[idx..].to_lowercase(),
        None => name.to_lowercase(),
    }
}

fn place_entry(
    entry: &mut Entry,
    extension: &str,
    provider: &dyn MetadataProvider,
    request: &CopyRequest,
    items: &[Item<'_>],
) -> io::Result<EntryOutcome> {
    // The temp file is removed on drop, on every exit path below.
    let mut staged = tempfile::Builder::new()
        .prefix("photo-archive-")
        .suffix(extension)
        .tempfile()?;
    io::copy(entry, staged.as_file_mut())?;

    let taken = provider
        .metadata(staged.path())
        .and_then(|m| m.date_taken)
        .or_else(|| entry.date());
    let Some(taken) = taken else {
        return Ok(EntryOutcome::Skipped(SkipReason::NoDate));
    };

    if let Some(from) = request.from {
        if taken < from {
            return Ok(EntryOutcome::Skipped(SkipReason::OutsideDateWindow));
        }
    }
    if let Some(to) = request.to {
        if taken >= to {
            return Ok(EntryOutcome::Skipped(SkipReason::OutsideDateWindow));
        }
    }

    let bucket = taken.format_with_items(items.iter()).to_string();
    let target_dir = request.target_root.join(&bucket);
    fs::create_dir_all(&target_dir)?;

    let content_len = staged.as_file().metadata()?.len();
    let Some(destination) = resolve_collision(&target_dir, entry.name(), content_len)? else {
        return Ok(EntryOutcome::Skipped(SkipReason::AlreadyInTarget));
    };

    fs::copy(staged.path(), &destination)?;
    Ok(EntryOutcome::Copied(destination))
}

/// Pick a destination name, or `None` when a same-size copy already exists
///
/// Different-size collisions get `_1`, `_2`, ... inserted before the
/// extension until an unused or same-size name is found.
fn resolve_collision(dir: &Path, name: &str, content_len: u64) -> io::Result<Option<PathBuf>> {
    let (stem, suffix) = match name.rfind('.') {
        Some(idx) => (&name[..idx], &name[idx..]),
        None => (name, ""),
    };

    let mut candidate = dir.join(name);
    let mut counter = 1;
    loop {
        match fs::metadata(&candidate) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Some(candidate)),
            Err(e) => return Err(e),
            Ok(existing) if existing.len() == content_len => {
                tracing::debug!(path = %candidate.display(), "same-size file already in target");
                return Ok(None);
            }
            Ok(_) => {
                candidate = dir.join(format!("{}_{}{}", stem, counter, suffix));
                counter += 1;
            }
        }
    }
}
