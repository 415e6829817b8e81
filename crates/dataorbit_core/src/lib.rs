//! # DataOrbit Core
//!
//! Embedded multi-table record store persisted to a single file.
//!
//! This crate provides:
//! - Table schemas with typed columns, a primary key, and unique columns
//! - The [`Store`]: write-through CRUD over named tables
//! - Automatic integer primary keys per table
//! - A constraint index enforcing uniqueness
//! - Timer-driven snapshots of the data file
//!
//! Every successful mutation rewrites the data file whole: the dataset is
//! serialized as JSON, obfuscated with a repeating-key XOR, and written
//! through a temp file and rename. The XOR layer is obfuscation only.
//!
//! ## Example
//!
//! ```rust
//! use dataorbit_core::{ColumnType, Config, Row, Store, TableSchema, Value};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let config = Config::new(dir.path().join("database.json"), "mySecretKey").table(
//!     "users",
//!     TableSchema::new()
//!         .column("name", ColumnType::Text)
//!         .column("age", ColumnType::Number),
//! );
//! let store = Store::open(config).unwrap();
//!
//! let id = store
//!     .insert("users", Row::new().with("name", "John").with("age", 30))
//!     .unwrap();
//! assert_eq!(id, Value::from(1));
//! assert_eq!(store.get_all_rows("users").len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod allocator;
mod backup;
mod config;
mod error;
mod index;
mod schema;
mod state;
mod store;
mod types;

pub use allocator::KeyAllocator;
pub use backup::BackupService;
pub use config::{BackupPolicy, Config};
pub use error::{CoreError, CoreResult};
pub use index::ConstraintIndex;
pub use schema::{TableSchema, DEFAULT_PRIMARY_KEY};
pub use store::Store;
pub use types::{ColumnType, Row, Value};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
