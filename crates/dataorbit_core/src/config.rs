//! Store configuration.

use crate::error::{CoreError, CoreResult};
use crate::schema::TableSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SECONDS_PER_DAY: f64 = 24.0 * 60.0 * 60.0;

/// How often the backup service snapshots the data file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackupPolicy {
    /// Interval between snapshots, in days. Fractions are allowed.
    #[serde(rename = "interval", alias = "intervalDays")]
    pub interval_days: f64,
}

impl BackupPolicy {
    /// Snapshot every `days` days.
    #[must_use]
    pub const fn days(days: f64) -> Self {
        Self {
            interval_days: days,
        }
    }

    /// Snapshot at an arbitrary cadence.
    #[must_use]
    pub fn every(interval: Duration) -> Self {
        Self {
            interval_days: interval.as_secs_f64() / SECONDS_PER_DAY,
        }
    }

    /// Returns the interval as a `Duration`.
    ///
    /// Non-positive or non-finite intervals yield `Duration::ZERO`;
    /// [`Config::validate`] rejects them.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval_days * SECONDS_PER_DAY).unwrap_or(Duration::ZERO)
    }
}

/// Configuration for opening a store.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Path of the data file.
    pub file: PathBuf,

    /// Key for the repeating-key XOR applied to the data file.
    ///
    /// This obfuscates the file; it does not encrypt it.
    #[serde(rename = "encryptionKey", alias = "obfuscationKey")]
    pub obfuscation_key: String,

    /// Table schemas keyed by table name.
    #[serde(default)]
    pub tables: BTreeMap<String, TableSchema>,

    /// Snapshot policies run by the backup service.
    #[serde(default)]
    pub backups: Vec<BackupPolicy>,

    /// Whether to hold an advisory lock on `<file>.lock` while the store is
    /// open.
    #[serde(default = "default_lock")]
    pub lock: bool,
}

fn default_lock() -> bool {
    true
}

impl Config {
    /// Creates a configuration for the data file at `file`.
    pub fn new(file: impl Into<PathBuf>, obfuscation_key: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            obfuscation_key: obfuscation_key.into(),
            tables: BTreeMap::new(),
            backups: Vec::new(),
            lock: true,
        }
    }

    /// Declares a table.
    #[must_use]
    pub fn table(mut self, name: impl Into<String>, schema: TableSchema) -> Self {
        self.tables.insert(name.into(), schema);
        self
    }

    /// Adds a backup policy.
    #[must_use]
    pub fn backup(mut self, policy: BackupPolicy) -> Self {
        self.backups.push(policy);
        self
    }

    /// Sets whether to hold the data file lock.
    #[must_use]
    pub const fn lock(mut self, value: bool) -> Self {
        self.lock = value;
        self
    }

    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the JSON is malformed.
    pub fn from_json(text: &str) -> CoreResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| CoreError::configuration(format!("invalid configuration: {e}")))
    }

    /// Reads a configuration from a JSON file.
    ///
    /// A relative `file` inside the configuration is resolved against the
    /// configuration file's directory.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CoreError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut config = Self::from_json(&text)?;
        if config.file.is_relative() {
            if let Some(base) = path.parent() {
                config.file = base.join(&config.file);
            }
        }
        Ok(config)
    }

    /// Checks the configuration before a store is opened.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for an empty key, an empty file path, an
    /// inconsistent schema, or a non-positive backup interval.
    pub fn validate(&self) -> CoreResult<()> {
        if self.obfuscation_key.is_empty() {
            return Err(CoreError::configuration(
                "obfuscation key must not be empty",
            ));
        }
        if self.file.as_os_str().is_empty() {
            return Err(CoreError::configuration("data file path must not be empty"));
        }
        for (name, schema) in &self.tables {
            schema.validate(name)?;
        }
        for policy in &self.backups {
            if !(policy.interval_days.is_finite() && policy.interval_days > 0.0)
                || policy.interval().is_zero()
            {
                return Err(CoreError::configuration(format!(
                    "backup interval must be positive, got {} days",
                    policy.interval_days
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("file", &self.file)
            .field("obfuscation_key", &"[REDACTED]")
            .field("tables", &self.tables)
            .field("backups", &self.backups)
            .field("lock", &self.lock)
            .finish()
    }
}
