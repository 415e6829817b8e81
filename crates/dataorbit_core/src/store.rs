//! The table store facade.

use crate::backup::BackupService;
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::schema::TableSchema;
use crate::state::StoreState;
use crate::types::{Row, Value};
use dataorbit_codec::{ObfuscationKey, RawDataset};
use dataorbit_storage::{backup_dir_for, now_millis, unused_snapshot_path, DataFile, StoreLock};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An open DataOrbit store.
///
/// `Store` owns the dataset in memory and writes it through to the data
/// file after every successful mutation. Handles are cheap to clone and
/// share one state; every operation takes the same lock, so mutations,
/// reads, and snapshots never overlap.
///
/// # Opening a Store
///
/// ```rust,ignore
/// use dataorbit_core::{ColumnType, Config, Row, Store, TableSchema};
///
/// let config = Config::new("database.json", "mySecretKey").table(
///     "users",
///     TableSchema::new()
///         .column("name", ColumnType::Text)
///         .column("email", ColumnType::Text)
///         .unique("email"),
/// );
/// let store = Store::open(config)?;
///
/// let id = store.insert("users", Row::new().with("name", "Ada").with("email", "ada@x"))?;
/// assert!(store.get_row("users", "id", &id).is_some());
/// ```
///
/// # Failure Model
///
/// Opening fails only for configuration errors and lock contention. A data
/// file that cannot be read or decoded is reported through
/// [`load_diagnostic`](Self::load_diagnostic) and the store starts empty.
/// The first save after that copies the unreadable file into the backup
/// directory before replacing it, so a mistyped key does not lose data.
///
/// A mutation that fails to persist returns the error but keeps its effect
/// in memory; the next successful save writes it out.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    config: Config,
    key: ObfuscationKey,
    file: DataFile,
    /// Held for the lifetime of the store. None when locking is disabled.
    lock: Option<StoreLock>,
    load_diagnostic: Option<CoreError>,
    /// Set while an unreadable data file has yet to be copied aside.
    preserve_unreadable: AtomicBool,
    state: Mutex<StoreState>,
}

impl Store {
    /// Opens the store described by `config`, loading the data file if it
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the configuration is invalid, and
    /// `Persistence` if the data file is locked by another store.
    pub fn open(config: Config) -> CoreResult<Self> {
        config.validate()?;
        let key = ObfuscationKey::new(&config.obfuscation_key).map_err(CoreError::from_key_error)?;
        let file = DataFile::new(&config.file)?;
        let lock = if config.lock {
            Some(StoreLock::acquire(file.path())?)
        } else {
            None
        };

        let (state, load_diagnostic) = match Self::load_state(&config, &file, &key) {
            Ok(state) => (state, None),
            Err(err) => {
                warn!(
                    path = %file.path().display(),
                    error = %err,
                    "could not load data file; starting with an empty store"
                );
                (StoreState::new(config.tables.clone()), Some(err))
            }
        };

        let preserve_unreadable = load_diagnostic.is_some() && file.exists();

        info!(
            path = %file.path().display(),
            tables = state.tables.len(),
            "store opened"
        );

        Ok(Self {
            inner: Arc::new(StoreInner {
                config,
                key,
                file,
                lock,
                load_diagnostic,
                preserve_unreadable: AtomicBool::new(preserve_unreadable),
                state: Mutex::new(state),
            }),
        })
    }

    fn load_state(config: &Config, file: &DataFile, key: &ObfuscationKey) -> CoreResult<StoreState> {
        let Some(blob) = file.load()? else {
            debug!(path = %file.path().display(), "no data file yet");
            return Ok(StoreState::new(config.tables.clone()));
        };
        let raw: RawDataset = dataorbit_codec::open(&blob, key)?;
        StoreState::from_dataset(config.tables.clone(), &raw)
    }

    /// Serializes, obfuscates, and atomically rewrites the data file.
    ///
    /// Called with the state lock held.
    fn persist(&self, state: &StoreState) -> CoreResult<()> {
        let blob = dataorbit_codec::seal(&state.tables, &self.inner.key)?;
        if self.inner.preserve_unreadable.load(Ordering::Acquire) {
            self.preserve_unreadable()?;
        }
        self.inner.file.save(&blob)?;
        Ok(())
    }

    /// Copies the data file that failed to load into the backup directory.
    fn preserve_unreadable(&self) -> CoreResult<()> {
        if !self.inner.file.exists() {
            self.inner.preserve_unreadable.store(false, Ordering::Release);
            return Ok(());
        }
        let dest = unused_snapshot_path(&self.backup_dir(), now_millis());
        self.inner.file.snapshot_to(&dest)?;
        self.inner.preserve_unreadable.store(false, Ordering::Release);
        warn!(
            snapshot = %dest.display(),
            "unreadable data file copied aside before overwrite"
        );
        Ok(())
    }

    // ========================================================================
    // Tables
    // ========================================================================

    /// Creates a table with `schema`.
    ///
    /// Does nothing if the table already holds data.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the schema is inconsistent, or a
    /// persistence error if the save fails.
    pub fn create_table(&self, name: &str, schema: TableSchema) -> CoreResult<()> {
        schema.validate(name)?;
        let mut state = self.inner.state.lock();
        if state.tables.contains_key(name) {
            debug!(table = name, "create_table: already exists");
            return Ok(());
        }

        state.index.rebuild(name, &schema, &[]);
        state.schemas.insert(name.to_string(), schema);
        state.tables.insert(name.to_string(), Vec::new());
        debug!(table = name, "table created");
        self.persist(&state)
    }

    /// Drops a table and all of its rows.
    ///
    /// Key counters and unique-value entries go with it. A schema from the
    /// configuration stays registered, so the table can be written again.
    /// Does nothing if the table holds no data.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the save fails.
    pub fn drop_table(&self, name: &str) -> CoreResult<()> {
        let mut state = self.inner.state.lock();
        let Some(rows) = state.tables.remove(name) else {
            debug!(table = name, "drop_table: no such table");
            return Ok(());
        };

        state.allocator.forget(name);
        state.index.forget(name);
        match self.inner.config.tables.get(name) {
            Some(configured) => {
                state.schemas.insert(name.to_string(), configured.clone());
            }
            None => {
                state.schemas.remove(name);
            }
        }
        debug!(table = name, rows = rows.len(), "table dropped");
        self.persist(&state)
    }

    // ========================================================================
    // Rows
    // ========================================================================

    /// Inserts a row and returns its primary key.
    ///
    /// A missing primary key is generated: the next integer for the table,
    /// as a `Number` or its decimal `Text` depending on the column type.
    ///
    /// # Errors
    ///
    /// - `UnknownTable` if the table has no schema
    /// - `SchemaViolation` if a column is undeclared or has the wrong type
    /// - `UniqueConstraintViolation` if a unique value is already taken
    ///
    /// None of these change the store. A persistence error is returned after
    /// the row has been added in memory.
    pub fn insert(&self, table: &str, mut row: Row) -> CoreResult<Value> {
        let mut state = self.inner.state.lock();
        let schema = state.schema(table)?.clone();
        schema.check_row(table, &row)?;

        let pk = schema.primary_key_column();
        let (generated, key) = match row.get(pk) {
            Some(key) => (None, key.clone()),
            None => {
                let (n, key) = state.candidate_key(table, &schema)?;
                row.set(pk, key.clone());
                (Some(n), key)
            }
        };

        if let Some((column, value)) = state.index.find_conflict(table, &schema, &row, None) {
            return Err(CoreError::unique_violation(table, column, value.clone()));
        }

        if generated.is_some() {
            let claimed = state.allocator.next_key(table);
            debug_assert_eq!(claimed, generated);
        }
        state.index.add(table, &schema, &row);
        state.tables.entry(table.to_string()).or_default().push(row);
        debug!(table, key = %key, "row inserted");

        self.persist(&state)?;
        Ok(key)
    }

    /// Deletes every row whose `column` equals `value`, returning how many
    /// were removed.
    ///
    /// Unknown tables and misses are not errors. Removed unique values
    /// become available again; primary keys are never generated twice.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the save fails.
    pub fn delete(&self, table: &str, column: &str, value: &Value) -> CoreResult<usize> {
        let mut state = self.inner.state.lock();
        let StoreState {
            schemas,
            tables,
            index,
            ..
        } = &mut *state;
        let (Some(schema), Some(rows)) = (schemas.get(table), tables.get_mut(table)) else {
            return Ok(0);
        };

        let before = rows.len();
        rows.retain(|row| {
            let matches = row.get(column) == Some(value);
            if matches {
                index.remove(table, schema, row);
            }
            !matches
        });
        let removed = before - rows.len();
        if removed == 0 {
            return Ok(0);
        }

        debug!(table, column, value = %value, removed, "rows deleted");
        self.persist(&state)?;
        Ok(removed)
    }

    /// Merges `patch` into the row whose `key_column` equals
    /// `patch[key_column]`.
    ///
    /// Columns absent from the patch keep their values. Returns `false`
    /// without touching anything if the table, the lookup value, or the row
    /// is missing.
    ///
    /// # Errors
    ///
    /// - `SchemaViolation` if the patch does not fit the schema
    /// - `UniqueConstraintViolation` if a changed unique value is taken by
    ///   another row
    ///
    /// Both leave the row as it was.
    pub fn edit(&self, table: &str, key_column: &str, patch: &Row) -> CoreResult<bool> {
        let mut state = self.inner.state.lock();
        let Some(lookup) = patch.get(key_column) else {
            return Ok(false);
        };
        let Some(schema) = state.schemas.get(table).cloned() else {
            return Ok(false);
        };
        let Some(position) = state
            .rows(table)
            .iter()
            .position(|row| row.get(key_column) == Some(lookup))
        else {
            return Ok(false);
        };

        schema.check_row(table, patch)?;

        let old = state.rows(table)[position].clone();
        let mut merged = old.clone();
        merged.merge(patch);

        if let Some((column, value)) = state.index.find_conflict(table, &schema, &merged, Some(&old))
        {
            return Err(CoreError::unique_violation(table, column, value.clone()));
        }

        state.index.remove(table, &schema, &old);
        state.index.add(table, &schema, &merged);
        if let Some(rows) = state.tables.get_mut(table) {
            rows[position] = merged;
        }
        debug!(table, key_column, key = %lookup, "row edited");

        self.persist(&state)?;
        Ok(true)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Returns every row of `table` in insertion order.
    #[must_use]
    pub fn get_all_rows(&self, table: &str) -> Vec<Row> {
        self.inner.state.lock().rows(table).to_vec()
    }

    /// Returns the first row whose `column` equals `value`.
    #[must_use]
    pub fn get_row(&self, table: &str, column: &str, value: &Value) -> Option<Row> {
        self.inner
            .state
            .lock()
            .rows(table)
            .iter()
            .find(|row| row.get(column) == Some(value))
            .cloned()
    }

    /// Returns `column` of every row of `table`, one entry per row, in
    /// insertion order. Rows without the column yield `None`.
    #[must_use]
    pub fn get_column(&self, table: &str, column: &str) -> Vec<Option<Value>> {
        self.inner
            .state
            .lock()
            .rows(table)
            .iter()
            .map(|row| row.get(column).cloned())
            .collect()
    }

    /// Same as [`get_column`](Self::get_column).
    #[must_use]
    pub fn get_all_columns(&self, table: &str, column: &str) -> Vec<Option<Value>> {
        self.get_column(table, column)
    }

    /// Returns the names of the tables holding data, sorted.
    #[must_use]
    pub fn tables(&self) -> Vec<String> {
        self.inner.state.lock().tables.keys().cloned().collect()
    }

    /// Returns the schema in effect for `table`.
    #[must_use]
    pub fn schema(&self, table: &str) -> Option<TableSchema> {
        self.inner.state.lock().schemas.get(table).cloned()
    }

    /// Returns the number of rows in `table`.
    #[must_use]
    pub fn row_count(&self, table: &str) -> usize {
        self.inner.state.lock().rows(table).len()
    }

    /// Returns the key the next insert without a primary key would get,
    /// per table with a counter.
    #[must_use]
    pub fn key_counters(&self) -> Vec<(String, u64)> {
        let state = self.inner.state.lock();
        let mut counters: Vec<_> = state
            .allocator
            .counters()
            .map(|(table, next)| (table.to_string(), next))
            .collect();
        counters.sort();
        counters
    }

    // ========================================================================
    // Backups
    // ========================================================================

    /// Copies the data file into the backup directory now and returns the
    /// snapshot path.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the data file does not exist yet or
    /// the copy fails.
    pub fn backup_now(&self) -> CoreResult<PathBuf> {
        let _state = self.inner.state.lock();
        let dir = backup_dir_for(self.inner.file.path());
        let dest = unused_snapshot_path(&dir, now_millis());
        let bytes = self.inner.file.snapshot_to(&dest)?;
        debug!(snapshot = %dest.display(), bytes, "snapshot written");
        Ok(dest)
    }

    /// Starts one timer thread per configured backup policy.
    ///
    /// The service stops when [`BackupService::stop`] is called or it is
    /// dropped.
    #[must_use = "dropping the service stops the backups"]
    pub fn start_backup_service(&self) -> BackupService {
        BackupService::start(self.clone(), &self.inner.config.backups)
    }

    /// Returns the directory snapshots are written to.
    #[must_use]
    pub fn backup_dir(&self) -> PathBuf {
        backup_dir_for(self.inner.file.path())
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Returns why the data file could not be loaded at open, if it could
    /// not.
    #[must_use]
    pub fn load_diagnostic(&self) -> Option<&CoreError> {
        self.inner.load_diagnostic.as_ref()
    }

    /// Returns the path of the data file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.file.path()
    }

    /// Returns the configuration the store was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Returns true if this store holds the data file lock.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.inner.lock.is_some()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.path())
            .field("tables", &self.tables())
            .field("locked", &self.is_locked())
            .finish_non_exhaustive()
    }
}
