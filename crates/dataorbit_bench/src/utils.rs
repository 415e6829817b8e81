//! Benchmark utilities.

use dataorbit_codec::{RawDataset, RawRow};
use dataorbit_core::{ColumnType, Config, Row, Store, TableSchema};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tempfile::TempDir;

/// Key used by every benchmark store.
pub const BENCH_KEY: &str = "benchKey";

/// Generate random bytes of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate a random alphanumeric string.
pub fn random_text(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Schema of the `items` table: generated numeric `id`, unique `code`.
pub fn items_schema() -> TableSchema {
    TableSchema::new()
        .column("code", ColumnType::Text)
        .column("label", ColumnType::Text)
        .column("qty", ColumnType::Number)
        .unique("code")
}

/// Generate an `items` row whose `code` is derived from `n`.
pub fn item_row(n: usize, label_len: usize) -> Row {
    Row::new()
        .with("code", format!("item-{n:08}"))
        .with("label", random_text(label_len))
        .with("qty", rand::thread_rng().gen_range(0..1000))
}

/// Generate a decoded dataset with `rows` rows in one `items` table.
pub fn generate_dataset(rows: usize, label_len: usize) -> RawDataset {
    let items = (0..rows)
        .map(|n| {
            let mut raw = item_row(n, label_len).to_json();
            raw.insert("id".into(), serde_json::Value::from(n + 1));
            raw
        })
        .collect::<Vec<RawRow>>();
    RawDataset::from([("items".to_string(), items)])
}

/// Open a fresh store with the `items` table in a temporary directory.
///
/// The directory must outlive the store.
pub fn bench_store() -> (TempDir, Store) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = Config::new(dir.path().join("bench.json"), BENCH_KEY).table("items", items_schema());
    let store = Store::open(config).expect("Failed to open store");
    (dir, store)
}

/// Open a store and fill `items` with `rows` rows.
pub fn populated_store(rows: usize, label_len: usize) -> (TempDir, Store) {
    let (dir, store) = bench_store();
    for n in 0..rows {
        store
            .insert("items", item_row(n, label_len))
            .expect("Failed to insert");
    }
    (dir, store)
}
