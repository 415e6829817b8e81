//! DataOrbit quickstart.
//!
//! Opens (or creates) `./database.json` with two tables, inserts a user and
//! a product, starts the daily backup service, and reads the rows back.
//! Running it twice reports the duplicate keys instead of inserting again.
//!
//! Run with: cargo run -p quickstart

use dataorbit_core::{BackupPolicy, ColumnType, Config, CoreError, Row, Store, TableSchema, Value};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn config() -> Config {
    Config::new("./database.json", "mySecretKey")
        .table(
            "users",
            TableSchema::new()
                .column("id", ColumnType::Text)
                .column("name", ColumnType::Text)
                .column("age", ColumnType::Number),
        )
        .table(
            "products",
            TableSchema::new()
                .column("id", ColumnType::Text)
                .column("name", ColumnType::Text)
                .column("price", ColumnType::Number),
        )
        .backup(BackupPolicy::days(1.0))
}

/// Inserts `row`, treating an existing key as already seeded.
fn seed(store: &Store, table: &str, row: Row) -> Result<(), CoreError> {
    match store.insert(table, row) {
        Ok(key) => {
            info!(table, %key, "inserted");
            Ok(())
        }
        Err(err @ CoreError::UniqueConstraintViolation { .. }) => {
            warn!(table, error = %err, "already seeded");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let store = Store::open(config())?;
    if let Some(err) = store.load_diagnostic() {
        warn!(error = %err, "started from an empty store");
    }

    seed(
        &store,
        "users",
        Row::new().with("id", "1").with("name", "John Doe").with("age", 30),
    )?;
    seed(
        &store,
        "products",
        Row::new()
            .with("id", "1")
            .with("name", "Product A")
            .with("price", 10.99),
    )?;

    let backups = store.start_backup_service();
    info!(timers = backups.timer_count(), dir = %store.backup_dir().display(), "backup service running");

    let user = store.get_row("users", "id", &Value::from("1"));
    println!("Specific user: {user:?}");

    let names: Vec<String> = store
        .get_column("users", "name")
        .into_iter()
        .flatten()
        .map(|v| v.to_string())
        .collect();
    println!("All user names: {names:?}");

    let snapshot = store.backup_now()?;
    println!("Snapshot written to {}", snapshot.display());

    drop(backups);
    Ok(())
}
