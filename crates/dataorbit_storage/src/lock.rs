//! Single-writer lock for a data file.

use crate::error::{StorageError, StorageResult};
use crate::file::sibling_with_suffix;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Suffix of the lock file placed next to the data file.
const LOCK_SUFFIX: &str = "lock";

/// Advisory exclusive lock on `<file>.lock`.
///
/// Only one `StoreLock` per data file can exist at a time, across
/// processes. The lock is released when the value is dropped.
///
/// # Example
///
/// ```rust,ignore
/// let lock = StoreLock::acquire(Path::new("database.json"))?;
/// // a second acquire on the same path fails with `StorageError::Locked`
/// ```
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    _file: File,
}

impl StoreLock {
    /// Acquires the lock for the data file at `data_file` without blocking.
    ///
    /// # Errors
    ///
    /// Returns `Locked` if another handle holds the lock, or an I/O error if
    /// the lock file cannot be created.
    pub fn acquire(data_file: &Path) -> StorageResult<Self> {
        let path = sibling_with_suffix(data_file, LOCK_SUFFIX);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        if file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked { path });
        }

        Ok(Self { path, _file: file })
    }

    /// Returns the path to the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
