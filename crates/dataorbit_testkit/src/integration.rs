//! Cross-crate integration test helpers.
//!
//! Provides utilities for testing the store against a simple in-memory
//! model, and for checking what the store leaves on disk with the codec and
//! storage crates directly.

use crate::fixtures::TestStore;
use crate::generators::StoreOperation;
use dataorbit_core::{CoreError, Row, Value};
use std::collections::BTreeMap;

const TABLE: &str = "accounts";

/// A test harness that mirrors every operation on the fixture `accounts`
/// table in a model and checks the store agrees.
pub struct IntegrationHarness {
    /// The store under test.
    pub store: TestStore,
    /// Expected rows by primary key, in insertion order of keys.
    model: BTreeMap<u64, Row>,
    /// Next key the store should generate.
    next_key: u64,
}

impl IntegrationHarness {
    /// Creates a harness over a fresh fixture store.
    pub fn new() -> Self {
        Self {
            store: TestStore::new(),
            model: BTreeMap::new(),
            next_key: 1,
        }
    }

    fn email_taken(&self, email: &str, except: Option<u64>) -> bool {
        let email = Value::from(email);
        self.model
            .iter()
            .any(|(key, row)| Some(*key) != except && row.get("email") == Some(&email))
    }

    /// Applies one operation to the store and the model, asserting both agree.
    pub fn apply(&mut self, op: &StoreOperation) {
        match op {
            StoreOperation::Insert { name, email } => {
                let row = Row::new()
                    .with("name", name.as_str())
                    .with("email", email.as_str());
                let result = self.store.insert(TABLE, row.clone());
                if self.email_taken(email, None) {
                    assert!(
                        matches!(result, Err(CoreError::UniqueConstraintViolation { .. })),
                        "duplicate email {email} was accepted: {result:?}"
                    );
                } else {
                    let key = result.expect("Failed to insert");
                    assert_eq!(key, Value::from(self.next_key));
                    self.model
                        .insert(self.next_key, row.with("id", self.next_key));
                    self.next_key += 1;
                }
            }
            StoreOperation::Delete { key } => {
                let removed = self
                    .store
                    .delete(TABLE, "id", &Value::from(*key))
                    .expect("Failed to delete");
                let expected = usize::from(self.model.remove(key).is_some());
                assert_eq!(removed, expected);
            }
            StoreOperation::Edit { key, email } => {
                let patch = Row::new().with("id", *key).with("email", email.as_str());
                let result = self.store.edit(TABLE, "id", &patch);
                if !self.model.contains_key(key) {
                    assert!(!result.expect("Failed to edit"));
                } else if self.email_taken(email, Some(*key)) {
                    assert!(matches!(
                        result,
                        Err(CoreError::UniqueConstraintViolation { .. })
                    ));
                } else {
                    assert!(result.expect("Failed to edit"));
                    if let Some(row) = self.model.get_mut(key) {
                        row.merge(&patch);
                    }
                }
            }
            StoreOperation::Get { key } => {
                let actual = self.store.get_row(TABLE, "id", &Value::from(*key));
                assert_eq!(actual.as_ref(), self.model.get(key));
            }
        }
    }

    /// Verifies the store holds exactly the modelled rows, in key order.
    pub fn verify_all(&self) {
        let expected: Vec<Row> = self.model.values().cloned().collect();
        assert_eq!(self.store.get_all_rows(TABLE), expected);
        assert_eq!(
            self.store.get_column(TABLE, "id"),
            self.model
                .keys()
                .map(|k| Some(Value::from(*k)))
                .collect::<Vec<_>>()
        );
    }

    /// Reopens the store from disk; the key counter restarts past the
    /// largest remaining key.
    pub fn reopen(&mut self) {
        self.store.reopen();
        self.next_key = self.model.keys().next_back().map_or(1, |k| k + 1);
    }

    /// Returns the count of modelled rows.
    pub fn tracked_count(&self) -> usize {
        self.model.len()
    }
}

impl Default for IntegrationHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Codec and storage checks against the bytes a store writes.
pub mod on_disk {
    use dataorbit_codec::{deobfuscate, open, ObfuscationKey, RawDataset};
    use dataorbit_storage::DataFile;
    use std::path::Path;

    /// Reads the data file and decodes it with `key`.
    pub fn read_dataset(path: &Path, key: &str) -> RawDataset {
        let blob = DataFile::new(path)
            .expect("Invalid data file path")
            .load()
            .expect("Failed to read data file")
            .expect("Data file is empty");
        let key = ObfuscationKey::new(key).expect("Empty key");
        open(&blob, &key).expect("Failed to decode data file")
    }

    /// Reads the data file and returns the JSON text under the XOR layer.
    pub fn read_plaintext(path: &Path, key: &str) -> String {
        let blob = std::fs::read(path).expect("Failed to read data file");
        let plain = deobfuscate(&blob, key.as_bytes()).expect("Empty key");
        String::from_utf8(plain).expect("Data file is not UTF-8 JSON")
    }
}
