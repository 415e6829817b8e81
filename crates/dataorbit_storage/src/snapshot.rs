//! Snapshot directory layout.
//!
//! Snapshots live next to the data file:
//!
//! ```text
//! <file>_backups/
//! ├─ 1718000000000_backup.json
//! └─ 1718086400000_backup.json
//! ```
//!
//! Each snapshot is a raw copy of the data file, still obfuscated.

use crate::error::StorageResult;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Suffix appended to the data file path to form the snapshot directory.
const BACKUP_DIR_SUFFIX: &str = "_backups";
/// Suffix of every snapshot file name.
const SNAPSHOT_SUFFIX: &str = "_backup.json";

/// A snapshot file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    /// Timestamp encoded in the file name (Unix milliseconds).
    pub timestamp_ms: u64,
    /// Full path of the snapshot file.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

/// Returns the snapshot directory for a data file (`<file>_backups`).
#[must_use]
pub fn backup_dir_for(data_file: &Path) -> PathBuf {
    let mut name = data_file.as_os_str().to_os_string();
    name.push(BACKUP_DIR_SUFFIX);
    PathBuf::from(name)
}

/// Returns the snapshot file name for a timestamp.
#[must_use]
pub fn snapshot_file_name(timestamp_ms: u64) -> String {
    format!("{timestamp_ms}{SNAPSHOT_SUFFIX}")
}

/// Parses the timestamp out of a snapshot file name.
#[must_use]
pub fn parse_snapshot_file_name(name: &str) -> Option<u64> {
    name.strip_suffix(SNAPSHOT_SUFFIX)?.parse().ok()
}

/// Current wall-clock time in Unix milliseconds.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Picks a free snapshot path in `dir`, starting at `timestamp_ms`.
///
/// If a snapshot with that timestamp already exists, the timestamp is
/// advanced one millisecond at a time until the name is unused.
#[must_use]
pub fn unused_snapshot_path(dir: &Path, timestamp_ms: u64) -> PathBuf {
    let mut ts = timestamp_ms;
    loop {
        let candidate = dir.join(snapshot_file_name(ts));
        if !candidate.exists() {
            return candidate;
        }
        ts = ts.saturating_add(1);
    }
}

/// Lists snapshot files in `dir`, oldest first.
///
/// A missing directory yields an empty list. Files that do not follow the
/// naming scheme are ignored.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be read.
pub fn list_snapshots(dir: &Path) -> StorageResult<Vec<SnapshotEntry>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut snapshots = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(timestamp_ms) = name.to_str().and_then(parse_snapshot_file_name) else {
            continue;
        };
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        snapshots.push(SnapshotEntry {
            timestamp_ms,
            path: entry.path(),
            size: metadata.len(),
        });
    }

    snapshots.sort_by_key(|s| s.timestamp_ms);
    Ok(snapshots)
}
