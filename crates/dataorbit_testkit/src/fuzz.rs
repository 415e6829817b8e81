//! Fuzz testing harnesses for DataOrbit.
//!
//! This module provides fuzz targets that can be used with cargo-fuzz
//! or other fuzzing frameworks.

use crate::fixtures::TestStore;
use dataorbit_codec::{deobfuscate, obfuscate, open, ObfuscationKey, RawDataset};
use dataorbit_core::{Config, Row, TableSchema, Value};

/// Fuzz target for data file decoding.
///
/// Tests that arbitrary bytes either decode to a dataset or return a
/// proper error (no panics), whatever the key.
pub fn fuzz_open_blob(data: &[u8]) {
    let Some((&first, rest)) = data.split_first() else {
        return;
    };
    let key_len = usize::from(first % 16) + 1;
    let (key, blob) = rest.split_at(key_len.min(rest.len()));
    if let Ok(key) = ObfuscationKey::from_bytes(key) {
        let _: Result<RawDataset, _> = open(blob, &key);
    }
}

/// Fuzz target for the obfuscation round trip.
pub fn fuzz_obfuscation_roundtrip(data: &[u8]) {
    let Some((&first, rest)) = data.split_first() else {
        return;
    };
    let key_len = usize::from(first % 32) + 1;
    if rest.len() < key_len {
        return;
    }
    let (key, plain) = rest.split_at(key_len);
    let blob = obfuscate(plain, key).expect("Non-empty key rejected");
    assert_eq!(blob.len(), plain.len());
    let back = deobfuscate(&blob, key).expect("Non-empty key rejected");
    assert_eq!(back, plain, "Roundtrip mismatch");
}

/// Fuzz target for configuration and schema parsing.
///
/// Tests that arbitrary text never panics the JSON layers.
pub fn fuzz_config_parse(data: &[u8]) {
    let text = String::from_utf8_lossy(data);
    if let Ok(config) = Config::from_json(&text) {
        let _ = config.validate();
    }
    let _: Result<TableSchema, _> = serde_json::from_str(&text);
}

/// Fuzz target for store operations.
///
/// Interprets the bytes as a sequence of operations on the fixture
/// `accounts` table and checks the store stays consistent.
pub fn fuzz_store_operations(data: &[u8]) {
    if data.len() < 2 {
        return;
    }

    let store = TestStore::new();
    for chunk in data.chunks(2) {
        let op = chunk[0];
        let arg = chunk.get(1).copied().unwrap_or(0);
        let key = Value::from(u32::from(arg % 16) + 1);
        let email = format!("user{}@example.com", arg % 8);

        match op % 5 {
            0 => {
                let _ = store.insert(
                    "accounts",
                    Row::new().with("name", "fuzz").with("email", email),
                );
            }
            1 => {
                let _ = store.delete("accounts", "id", &key);
            }
            2 => {
                let _ = store.edit(
                    "accounts",
                    "id",
                    &Row::new().with("id", key).with("email", email),
                );
            }
            3 => {
                let _ = store.get_row("accounts", "id", &key);
            }
            _ => {
                let _ = store.get_column("accounts", "email");
            }
        }
    }

    // Unique columns must still be unique.
    let emails: Vec<_> = store
        .get_column("accounts", "email")
        .into_iter()
        .flatten()
        .collect();
    let mut distinct = emails.clone();
    distinct.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
    distinct.dedup();
    assert_eq!(distinct.len(), emails.len(), "Duplicate email in store");
}
