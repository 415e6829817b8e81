//! CLI command implementations.

pub mod backup;
pub mod dump;
pub mod inspect;

use dataorbit_core::{Config, Store};
use std::path::Path;

/// Reads the JSON configuration at `path`.
pub fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    Ok(Config::from_json_file(path)?)
}

/// Opens the configured store without taking the data file lock, so a
/// running application keeps its lock.
pub fn open_unlocked(config_path: &Path) -> Result<Store, Box<dyn std::error::Error>> {
    let config = load_config(config_path)?.lock(false);
    Ok(Store::open(config)?)
}
