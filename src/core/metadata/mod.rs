//! # Metadata Module
//!
//! Per-format metadata capabilities and the registry that maps file
//! extensions to them.
//!
//! The engines never parse photo formats themselves; they look up a
//! [`MetadataProvider`] for a file's extension and ask it for a taken-date,
//! preview, dimensions, GPS marker and free-text details. Extensions without
//! a registered provider are simply not processable.
//!
//! ## Bundled providers
//! - [`ExifProvider`] - JPEG/TIFF, extracts EXIF fields
//! - [`PreviewOnlyProvider`] - PNG/GIF, preview but no date

use chrono::{DateTime, NaiveDateTime, Utc};
use exif::{In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Metadata extracted from one photo or video file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhotoMetadata {
    /// Original capture date/time (not necessarily the file date)
    pub date_taken: Option<DateTime<Utc>>,
    /// Small preview image (always a local file), if available
    pub preview_file: Option<PathBuf>,
    /// Image width in pixels
    pub width: Option<u32>,
    /// Image height in pixels
    pub height: Option<u32>,
    /// GPS information, if present
    pub gps_info: Option<String>,
    /// All relevant details in textual form
    pub details: String,
}

impl PhotoMetadata {
    /// Check if any field beyond the details text was extracted
    pub fn has_data(&self) -> bool {
        self.date_taken.is_some()
            || self.preview_file.is_some()
            || self.width.is_some()
            || self.height.is_some()
            || self.gps_info.is_some()
    }

    /// Get dimensions as a formatted string
    pub fn dimensions_display(&self) -> Option<String> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(format!("{}x{}", w, h)),
            _ => None,
        }
    }
}

/// The format-specific ability to extract metadata from one file
///
/// Providers receive a private local copy of the file, so they are free to
/// seek and re-read. Returning `None` means the file yielded no metadata at
/// all; it is a skip decision for the caller, never an error.
pub trait MetadataProvider: Send + Sync {
    fn metadata(&self, file: &Path) -> Option<PhotoMetadata>;
}

/// Maps lowercase dotted extensions (e.g. `.jpg`) to providers
///
/// An explicit map handed to the engines at construction; extension keys are
/// normalized to lowercase with a leading dot.
#[derive(Default, Clone)]
pub struct MetadataRegistry {
    providers: HashMap<String, Arc<dyn MetadataProvider>>,
}

impl MetadataRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the bundled providers registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let exif = Arc::new(ExifProvider);
        for ext in [".jpg", ".jpeg", ".tiff", ".tif"] {
            registry.register(ext, exif.clone());
        }
        let preview = Arc::new(PreviewOnlyProvider);
        for ext in [".png", ".gif"] {
            registry.register(ext, preview.clone());
        }
        registry
    }

    /// Register a provider for one extension
    pub fn register(&mut self, extension: &str, provider: Arc<dyn MetadataProvider>) {
        self.providers.insert(normalize(extension), provider);
    }

    /// Look up the provider for an extension, if any
    pub fn lookup(&self, extension: &str) -> Option<&Arc<dyn MetadataProvider>> {
        self.providers.get(&normalize(extension))
    }

    /// The registered extensions, for building source filters
    pub fn extensions(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

fn normalize(extension: &str) -> String {
    let lower = extension.to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}

/// EXIF-based provider for JPEG and TIFF files
pub struct ExifProvider;

impl MetadataProvider for ExifProvider {
    fn metadata(&self, file: &Path) -> Option<PhotoMetadata> {
        let handle = File::open(file).ok()?;
        let mut reader = BufReader::new(handle);
        let exif = Reader::new().read_from_container(&mut reader).ok()?;

        let mut metadata = PhotoMetadata {
            preview_file: Some(file.to_path_buf()),
            ..PhotoMetadata::default()
        };
        let mut details = Vec::new();

        if let Some(field) = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY) {
            metadata.date_taken = parse_exif_datetime(&field.value);
        }

        if let Some(field) = exif.get_field(Tag::PixelXDimension, In::PRIMARY) {
            metadata.width = get_u32_value(&field.value);
        }
        if let Some(field) = exif.get_field(Tag::PixelYDimension, In::PRIMARY) {
            metadata.height = get_u32_value(&field.value);
        }

        if exif.get_field(Tag::GPSLatitude, In::PRIMARY).is_some() {
            metadata.gps_info = Some("GPS data present".to_string());
        }

        if let Some(field) = exif.get_field(Tag::Make, In::PRIMARY) {
            if let Some(make) = get_string_value(&field.value) {
                details.push(format!("Make: {}", make));
            }
        }
        if let Some(field) = exif.get_field(Tag::Model, In::PRIMARY) {
            if let Some(model) = get_string_value(&field.value) {
                details.push(format!("Model: {}", model));
            }
        }
        if let Some(dimensions) = metadata.dimensions_display() {
            details.push(format!("Dimensions: {}", dimensions));
        }
        metadata.details = details.join("\n");

        Some(metadata)
    }
}

/// Provider for formats that carry no capture date, such as PNG and GIF
///
/// Supplies the file itself as a preview so these formats stay processable;
/// date placement then relies on the entry's fallback date.
pub struct PreviewOnlyProvider;

impl MetadataProvider for PreviewOnlyProvider {
    fn metadata(&self, file: &Path) -> Option<PhotoMetadata> {
        Some(PhotoMetadata {
            preview_file: Some(file.to_path_buf()),
            ..PhotoMetadata::default()
        })
    }
}

fn parse_exif_datetime(value: &Value) -> Option<DateTime<Utc>> {
    if let Value::Ascii(ref vec) = value {
        let bytes = vec.first()?;
        let s = std::str::from_utf8(bytes).ok()?;
        // EXIF date format: "YYYY:MM:DD HH:MM:SS"
        let naive = NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S").ok()?;
        return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    None
}

fn get_u32_value(value: &Value) -> Option<u32> {
    match value {
        Value::Long(vec) => vec.first().copied(),
        Value::Short(vec) => vec.first().map(|v| *v as u32),
        _ => None,
    }
}

fn get_string_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        if let Some(bytes) = vec.first() {
            if let Ok(s) = std::str::from_utf8(bytes) {
                let trimmed = s.trim_end_matches('\0').trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}
