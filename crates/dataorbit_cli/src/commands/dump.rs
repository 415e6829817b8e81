//! Dump command implementation.

use dataorbit_core::Store;
use serde_json::{Map, Value as Json};
use std::path::Path;

/// Runs the dump command, printing the decoded dataset as pretty JSON.
pub fn run(config_path: &Path, table: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_unlocked(config_path)?;
    if let Some(err) = store.load_diagnostic() {
        return Err(format!("cannot decode {}: {err}", store.path().display()).into());
    }

    let dataset = collect(&store, table)?;
    println!("{}", serde_json::to_string_pretty(&dataset)?);
    Ok(())
}

/// Builds the table name to rows map, optionally for a single table.
pub fn collect(store: &Store, table: Option<&str>) -> Result<Json, Box<dyn std::error::Error>> {
    let names = match table {
        Some(name) if store.tables().iter().any(|t| t == name) => vec![name.to_string()],
        Some(name) => return Err(format!("no table named {name}").into()),
        None => store.tables(),
    };

    let mut dataset = Map::new();
    for name in names {
        let rows: Vec<Json> = store
            .get_all_rows(&name)
            .iter()
            .map(|row| Json::Object(row.to_json()))
            .collect();
        dataset.insert(name, Json::Array(rows));
    }
    Ok(Json::Object(dataset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataorbit_core::{ColumnType, Config, Row, TableSchema};
    use serde_json::json;

    fn store(dir: &tempfile::TempDir) -> Store {
        let config = Config::new(dir.path().join("db.json"), "k")
            .table("users", TableSchema::new().column("name", ColumnType::Text))
            .table("tags", TableSchema::new().column("label", ColumnType::Text));
        let store = Store::open(config).unwrap();
        store.insert("users", Row::new().with("name", "Ada")).unwrap();
        store.insert("tags", Row::new().with("label", "x")).unwrap();
        store
    }

    #[test]
    fn dumps_every_table() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = collect(&store(&dir), None).unwrap();
        assert_eq!(
            dataset,
            json!({
                "tags": [{"id": 1, "label": "x"}],
                "users": [{"id": 1, "name": "Ada"}]
            })
        );
    }

    #[test]
    fn dumps_one_table() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = collect(&store(&dir), Some("users")).unwrap();
        assert_eq!(dataset, json!({"users": [{"id": 1, "name": "Ada"}]}));
    }

    #[test]
    fn unknown_table_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect(&store(&dir), Some("ghosts")).is_err());
    }
}
