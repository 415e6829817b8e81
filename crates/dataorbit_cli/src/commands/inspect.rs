//! Inspect command implementation.

use dataorbit_core::{Store, TableSchema};
use serde::Serialize;
use std::path::Path;

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Data file path.
    pub path: String,
    /// Data file size in bytes (0 if missing).
    pub file_size: u64,
    /// Why the data file could not be loaded, if it could not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
    /// Number of snapshot files in the backup directory.
    pub snapshot_count: usize,
    /// Per-table statistics.
    pub tables: Vec<TableStats>,
}

/// Statistics for a single table.
#[derive(Debug, Serialize)]
pub struct TableStats {
    /// Table name.
    pub name: String,
    /// Number of rows.
    pub rows: usize,
    /// Key the next insert without a primary key would receive.
    pub next_key: u64,
    /// Schema in effect (if `--schema` was requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<TableSchema>,
}

/// Runs the inspect command.
pub fn run(
    config_path: &Path,
    show_schema: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_unlocked(config_path)?;
    let result = collect(&store, show_schema)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Gathers the inspection result for an open store.
pub fn collect(store: &Store, show_schema: bool) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let file_size = std::fs::metadata(store.path()).map_or(0, |m| m.len());
    let snapshot_count = match dataorbit_storage::list_snapshots(&store.backup_dir()) {
        Ok(entries) => entries.len(),
        Err(_) => 0,
    };
    let counters = store.key_counters();

    let tables = store
        .tables()
        .into_iter()
        .map(|name| {
            let next_key = counters
                .iter()
                .find(|(table, _)| *table == name)
                .map_or(1, |(_, next)| *next);
            TableStats {
                rows: store.row_count(&name),
                next_key,
                schema: if show_schema { store.schema(&name) } else { None },
                name,
            }
        })
        .collect();

    Ok(InspectResult {
        path: store.path().display().to_string(),
        file_size,
        load_error: store.load_diagnostic().map(ToString::to_string),
        snapshot_count,
        tables,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("DataOrbit Store Inspection");
    println!("==========================");
    println!();
    println!("Path:      {}", result.path);
    println!("File size: {}", format_size(result.file_size));
    println!("Snapshots: {}", result.snapshot_count);
    if let Some(err) = &result.load_error {
        println!();
        println!("Load error: {err}");
    }

    println!();
    if result.tables.is_empty() {
        println!("Tables: (none)");
        return;
    }
    println!("Tables:");
    for table in &result.tables {
        println!(
            "  {:<20} {:>8} rows   next key {}",
            table.name, table.rows, table.next_key
        );
        if let Some(schema) = &table.schema {
            println!("    primary key: {}", schema.primary_key_column());
            for (column, ty) in schema.columns() {
                let unique = if schema.is_unique(column) { " (unique)" } else { "" };
                println!("    {column}: {ty}{unique}");
            }
        }
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataorbit_core::{ColumnType, Config, Row};

    #[test]
    fn collects_rows_and_counters() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path().join("db.json"), "k").table(
            "users",
            TableSchema::new().column("name", ColumnType::Text),
        );
        let store = Store::open(config).unwrap();
        store.insert("users", Row::new().with("name", "a")).unwrap();
        store.insert("users", Row::new().with("name", "b")).unwrap();

        let result = collect(&store, true).unwrap();
        assert_eq!(result.tables.len(), 1);
        assert_eq!(result.tables[0].rows, 2);
        assert_eq!(result.tables[0].next_key, 3);
        assert!(result.tables[0].schema.is_some());
        assert!(result.file_size > 0);
        assert!(result.load_error.is_none());
    }

    #[test]
    fn format_sizes() {
        assert_eq!(format_size(12), "12 bytes");
        assert_eq!(format_size(2048), "2.0 KB");
    }
}
