//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores in temporary
//! directories and common test scenarios.

use dataorbit_core::{ColumnType, Config, Store, TableSchema};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Obfuscation key used by every fixture.
pub const TEST_KEY: &str = "mySecretKey";

/// A test store with automatic cleanup.
pub struct TestStore {
    store: Option<Store>,
    config: Config,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: TempDir,
}

impl TestStore {
    /// Creates a store with the sample tables.
    pub fn new() -> Self {
        Self::with_config(|config| config)
    }

    /// Creates a store whose configuration is adjusted by `configure`.
    ///
    /// The data file lives in a fresh temporary directory and already carries
    /// the sample tables and the test key.
    pub fn with_config(configure: impl FnOnce(Config) -> Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = configure(sample_config(temp_dir.path().join("database.json")));
        let store = Store::open(config.clone()).expect("Failed to open store");
        Self {
            store: Some(store),
            config,
            temp_dir,
        }
    }

    /// Returns the data file path.
    pub fn path(&self) -> PathBuf {
        self.config.file.clone()
    }

    /// Returns the temporary directory holding the data file.
    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Returns the configuration the store was opened with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Closes the store and opens it again from the same file.
    pub fn reopen(&mut self) {
        // The lock must be released before the second open.
        self.store = None;
        self.store = Some(Store::open(self.config.clone()).expect("Failed to reopen store"));
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        self.store.as_ref().expect("test store is open")
    }
}

/// Schema of the sample `users` table: text primary key, name, age.
pub fn users_schema() -> TableSchema {
    TableSchema::new()
        .column("id", ColumnType::Text)
        .column("name", ColumnType::Text)
        .column("age", ColumnType::Number)
}

/// Schema of the sample `products` table: text primary key, name, price.
pub fn products_schema() -> TableSchema {
    TableSchema::new()
        .column("id", ColumnType::Text)
        .column("name", ColumnType::Text)
        .column("price", ColumnType::Number)
}

/// Schema of the sample `accounts` table: generated numeric key, unique
/// email, optional avatar path.
pub fn accounts_schema() -> TableSchema {
    TableSchema::new()
        .column("email", ColumnType::Text)
        .column("name", ColumnType::Text)
        .column("avatar", ColumnType::Path)
        .unique("email")
}

/// Configuration with the sample tables at `file`.
pub fn sample_config(file: PathBuf) -> Config {
    Config::new(file, TEST_KEY)
        .table("users", users_schema())
        .table("products", products_schema())
        .table("accounts", accounts_schema())
}

/// Runs a test with a temporary store holding the sample tables.
///
/// # Example
///
/// ```rust,ignore
/// use dataorbit_testkit::with_temp_store;
///
/// #[test]
/// fn my_test() {
///     with_temp_store(|store| {
///         store.insert("users", Row::new().with("name", "John")).unwrap();
///     });
/// }
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&Store) -> R,
{
    let test_store = TestStore::new();
    f(&*test_store)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use dataorbit_core::Row;

    /// Creates a store with `count` accounts, emails `user{i}@example.com`.
    pub fn populated_store(count: usize) -> TestStore {
        let test_store = TestStore::new();
        for i in 0..count {
            test_store
                .insert(
                    "accounts",
                    Row::new()
                        .with("name", format!("user {i}"))
                        .with("email", format!("user{i}@example.com")),
                )
                .expect("Failed to insert account");
        }
        test_store
    }

    /// Creates a store with `count` runtime tables `table_{i}`, one row each.
    pub fn multi_table_store(count: usize) -> (TestStore, Vec<String>) {
        let test_store = TestStore::new();
        let mut names = Vec::with_capacity(count);
        for i in 0..count {
            let name = format!("table_{i}");
            test_store
                .create_table(&name, TableSchema::new().column("n", ColumnType::Number))
                .expect("Failed to create table");
            test_store
                .insert(&name, Row::new().with("n", i as f64))
                .expect("Failed to insert row");
            names.push(name);
        }
        (test_store, names)
    }
}
