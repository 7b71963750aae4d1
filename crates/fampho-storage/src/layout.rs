//! Logical placement of files in the blob store.
//!
//! A key encodes purpose and library so files stay segregated, and carries a
//! millisecond timestamp plus a random component so two uploads of
//! `IMG_0001.JPG` at the same instant still land on different keys.

use chrono::Utc;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use uuid::Uuid;

const MAX_STEM_LEN: usize = 100;
const MAX_EXT_LEN: usize = 10;

/// Why a file is being stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoragePurpose {
    /// Upload staging area; files here are either promoted or deleted.
    Incoming,
    /// Final home of originals
    Master,
    /// Thumbnails, previews, rotations
    Derivative,
}

impl StoragePurpose {
    pub fn dir(&self) -> &'static str {
        match self {
            StoragePurpose::Incoming => "incoming",
            StoragePurpose::Master => "masters",
            StoragePurpose::Derivative => "derivatives",
        }
    }
}

impl Display for StoragePurpose {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.dir())
    }
}

/// Resolves storage keys for a (library, purpose) pair
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageLayout;

impl StorageLayout {
    pub fn new() -> Self {
        Self
    }

    /// Produce a fresh, collision-resistant key for `filename`.
    pub fn resolve(&self, library_id: Uuid, filename: &str, purpose: StoragePurpose) -> String {
        let (stem, ext) = split_name(filename);
        let unique = Uuid::new_v4().simple().to_string();
        format!(
            "{}/{}/{}_{}_{}{}",
            purpose.dir(),
            library_id,
            sanitize_filename(stem),
            Utc::now().timestamp_millis(),
            &unique[..8],
            ext
        )
    }

    /// Directory prefix holding every key of this library and purpose.
    pub fn prefix(&self, library_id: Uuid, purpose: StoragePurpose) -> String {
        format!("{}/{}", purpose.dir(), library_id)
    }
}

/// Reduce a filename stem to `[A-Za-z0-9_-]`, replacing everything else with `_`.
pub fn sanitize_filename(stem: &str) -> String {
    let s: String = stem
        .chars()
        .take(MAX_STEM_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.trim_matches('_').is_empty() {
        "file".to_string()
    } else {
        s
    }
}

/// Split into stem and a normalized `.ext` (lowercase, alphanumeric, possibly empty).
fn split_name(filename: &str) -> (&str, String) {
    let base = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    match base.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= MAX_EXT_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            (stem, format!(".{}", ext.to_ascii_lowercase()))
        }
        _ => (base, String::new()),
    }
}
