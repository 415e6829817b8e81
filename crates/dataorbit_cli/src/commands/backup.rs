//! Backup, snapshot listing, and restore commands.
//!
//! Snapshots are raw copies of the obfuscated data file. Restoring one
//! checks that it decodes with the configured key, then writes it back over
//! the data file through the same atomic save the store uses.

use dataorbit_codec::{ObfuscationKey, RawDataset};
use dataorbit_core::Config;
use dataorbit_storage::{list_snapshots, DataFile, SnapshotEntry, StoreLock};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Takes one snapshot of the data file now.
pub fn create(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_unlocked(config_path)?;
    info!("Snapshotting {}", store.path().display());

    let snapshot = store.backup_now()?;
    let size = fs::metadata(&snapshot)?.len();

    println!("✓ Snapshot created");
    println!("  Path: {}", snapshot.display());
    println!("  Size: {size} bytes");
    Ok(())
}

/// Lists the snapshot files of the configured store, oldest first.
pub fn list(config_path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_unlocked(config_path)?;
    let entries = list_snapshots(&store.backup_dir())?;

    match format {
        "json" => {
            let rows: Vec<_> = entries
                .iter()
                .map(|e| {
                    serde_json::json!({
                        "timestamp_ms": e.timestamp_ms,
                        "path": e.path.display().to_string(),
                        "size": e.size,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        _ => print_entries(&store.backup_dir(), &entries),
    }
    Ok(())
}

fn print_entries(dir: &Path, entries: &[SnapshotEntry]) {
    if entries.is_empty() {
        println!("No snapshots in {}", dir.display());
        return;
    }
    println!("Snapshots in {}:", dir.display());
    for entry in entries {
        println!(
            "  {:>15}  {:>10} bytes  {}",
            entry.timestamp_ms,
            entry.size,
            entry
                .path
                .file_name()
                .map_or_else(String::new, |n| n.to_string_lossy().into_owned())
        );
    }
}

/// Restores the data file from a snapshot.
///
/// Refuses to overwrite an existing data file unless `force` is set, and
/// refuses while another process holds the store lock.
pub fn restore(
    config_path: &Path,
    snapshot: &Path,
    force: bool,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let restored = restore_with(&config, snapshot, force)?;

    println!("✓ Data file restored");
    println!("  From: {}", snapshot.display());
    println!("  To:   {}", restored.display());
    Ok(restored)
}

/// Restores `snapshot` over the data file named by `config`.
pub fn restore_with(
    config: &Config,
    snapshot: &Path,
    force: bool,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    info!("Restoring {} from {}", config.file.display(), snapshot.display());
    config.validate()?;

    let _lock = StoreLock::acquire(&config.file)?;
    let target = DataFile::new(&config.file)?;
    if target.exists() && !force {
        return Err("Data file already exists. Use --force to overwrite.".into());
    }

    let blob = fs::read(snapshot)?;
    let key = ObfuscationKey::new(&config.obfuscation_key)?;
    let dataset: RawDataset = dataorbit_codec::open(&blob, &key)
        .map_err(|e| format!("snapshot does not decode with the configured key: {e}"))?;
    info!(tables = dataset.len(), "snapshot decoded");

    target.save(&blob)?;
    Ok(target.path().to_path_buf())
}
