//! Whole-file persistence for the data file.

use crate::error::{StorageError, StorageResult};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Suffix of the temporary file used for atomic saves.
const TEMP_SUFFIX: &str = "tmp";

/// The single file holding a store's (obfuscated) dataset.
///
/// The file is always replaced as a whole. Writes go to a sibling temporary
/// file first and are renamed over the target, so a crash mid-write leaves
/// either the previous content or the new content, never a truncated mix.
///
/// # Example
///
/// ```no_run
/// use dataorbit_storage::DataFile;
/// use std::path::Path;
///
/// let file = DataFile::new(Path::new("database.json")).unwrap();
/// file.save(b"payload").unwrap();
/// assert_eq!(file.load().unwrap().as_deref(), Some(&b"payload"[..]));
/// ```
#[derive(Debug, Clone)]
pub struct DataFile {
    path: PathBuf,
}

impl DataFile {
    /// Creates a handle for the data file at `path`.
    ///
    /// The file itself is not touched; it may not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the path has no file name component.
    pub fn new(path: &Path) -> StorageResult<Self> {
        if path.file_name().is_none() {
            return Err(StorageError::invalid_path(path, "path has no file name"));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Returns the path to the data file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path of the temporary file used during saves.
    #[must_use]
    pub fn temp_path(&self) -> PathBuf {
        sibling_with_suffix(&self.path, TEMP_SUFFIX)
    }

    /// Reads the whole file.
    ///
    /// Returns `None` if the file does not exist or is empty.
    ///
    /// # Errors
    ///
    /// Returns an error for any other read failure (permissions, I/O).
    pub fn load(&self) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(data) if data.is_empty() => Ok(None),
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replaces the file content atomically.
    ///
    /// 1. Write to the temporary sibling file
    /// 2. Sync it to disk
    /// 3. Rename it over the data file
    /// 4. Fsync the parent directory so the rename is durable
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The previous content is left in
    /// place when the failure happens before the rename.
    pub fn save(&self, data: &[u8]) -> StorageResult<()> {
        if let Some(parent) = non_empty_parent(&self.path) {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.temp_path();
        let mut file = File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        sync_parent(&self.path)?;
        tracing::trace!(path = %self.path.display(), bytes = data.len(), "data file saved");
        Ok(())
    }

    /// Copies the current file content byte for byte to `dest`.
    ///
    /// Creates the destination directory if needed. Returns the number of
    /// bytes copied.
    ///
    /// # Errors
    ///
    /// Returns an error if the data file does not exist or the copy fails.
    pub fn snapshot_to(&self, dest: &Path) -> StorageResult<u64> {
        if let Some(parent) = non_empty_parent(dest) {
            fs::create_dir_all(parent)?;
        }
        let copied = fs::copy(&self.path, dest)?;
        Ok(copied)
    }

    /// Returns true if the data file exists on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

/// Builds `<path>.<suffix>` next to `path`.
pub(crate) fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

#[cfg(unix)]
fn sync_parent(path: &Path) -> StorageResult<()> {
    let parent = non_empty_parent(path).unwrap_or_else(|| Path::new("."));
    let dir = File::open(parent)?;
    dir.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> StorageResult<()> {
    // NTFS journals metadata; directory handles cannot be fsynced here.
    Ok(())
}
