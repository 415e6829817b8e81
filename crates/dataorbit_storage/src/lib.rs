//! # DataOrbit Storage
//!
//! File persistence primitives for DataOrbit.
//!
//! This crate knows nothing about tables, rows, or obfuscation. It moves
//! opaque bytes between memory and a single data file, and copies that file
//! into a snapshot directory.
//!
//! ## Design Principles
//!
//! - The data file is always rewritten whole, through temp file + rename
//! - Missing or empty files load as "no data", not as errors
//! - Snapshots are raw byte copies of the data file
//! - One writer per data file, enforced with an advisory lock
//!
//! ## Example
//!
//! ```rust
//! use dataorbit_storage::DataFile;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let file = DataFile::new(&dir.path().join("database.json")).unwrap();
//! assert!(file.load().unwrap().is_none());
//!
//! file.save(b"hello world").unwrap();
//! assert_eq!(file.load().unwrap().unwrap(), b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod lock;
mod snapshot;

pub use error::{StorageError, StorageResult};
pub use file::DataFile;
pub use lock::StoreLock;
pub use snapshot::{
    backup_dir_for, list_snapshots, now_millis, parse_snapshot_file_name, snapshot_file_name,
    unused_snapshot_path, SnapshotEntry,
};
