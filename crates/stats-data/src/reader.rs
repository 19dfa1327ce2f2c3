//! Message file discovery and loading for SynapseStats.
//!
//! Reads one JSON message per file from the store directory and converts
//! them into [`MessageRecord`]s held in an immutable [`Snapshot`].

use std::path::{Path, PathBuf};

use stats_core::error::{Result, StatsError};
use stats_core::models::MessageRecord;
use tracing::{debug, warn};

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// The record collection materialised from the store at one point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Directory the records were read from.
    pub source: PathBuf,
    /// Successfully parsed records, in file-path order.
    pub records: Vec<MessageRecord>,
    /// Number of `.json` files found.
    pub files_scanned: usize,
    /// Files that could not be read or did not hold a message object.
    pub skipped_files: usize,
}

impl Snapshot {
    /// Wrap already-parsed records that did not come from disk.
    pub fn from_records(records: Vec<MessageRecord>) -> Self {
        Self {
            source: PathBuf::new(),
            files_scanned: records.len(),
            skipped_files: 0,
            records,
        }
    }

    /// Load a fresh snapshot from the same directory.
    ///
    /// `self` is left untouched so in-flight readers keep a consistent view
    /// until the caller swaps in the returned value.
    pub fn reload(&self) -> Snapshot {
        load_snapshot(&self.source)
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.json` files directly inside `dir`, sorted by path.
pub fn find_json_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Synapse path does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "json")
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Read and parse a single message file.
pub fn read_record(path: &Path) -> Result<MessageRecord> {
    let content = std::fs::read_to_string(path).map_err(|source| StatsError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    MessageRecord::from_value(&value).ok_or_else(|| StatsError::NotAnObject(path.to_path_buf()))
}

/// Load every message file in `dir` into a [`Snapshot`].
///
/// Files that fail to read or parse contribute nothing and are only
/// counted in [`Snapshot::skipped_files`].
pub fn load_snapshot(dir: &Path) -> Snapshot {
    let files = find_json_files(dir);

    let mut records = Vec::with_capacity(files.len());
    let mut skipped = 0usize;

    for file_path in &files {
        match read_record(file_path) {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                debug!("Skipping {}: {}", file_path.display(), e);
            }
        }
    }

    debug!(
        "Loaded {} messages from {} files ({} skipped)",
        records.len(),
        files.len(),
        skipped
    );

    Snapshot {
        source: dir.to_path_buf(),
        records,
        files_scanned: files.len(),
        skipped_files: skipped,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
