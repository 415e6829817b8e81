//! DataOrbit CLI
//!
//! Command-line tools for DataOrbit store maintenance.
//!
//! # Commands
//!
//! - `inspect` - Display tables, row counts, and key counters
//! - `dump` - Print the decoded dataset as JSON
//! - `backup` - Snapshot the data file now
//! - `snapshots` - List snapshot files
//! - `restore` - Copy a snapshot back over the data file

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// DataOrbit command-line store tools.
#[derive(Parser)]
#[command(name = "dataorbit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store's JSON configuration
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display tables, row counts, and key counters
    Inspect {
        /// Show each table's schema
        #[arg(short, long)]
        schema: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print the decoded dataset as JSON
    Dump {
        /// Only dump this table
        #[arg(short, long)]
        table: Option<String>,
    },

    /// Snapshot the data file into the backup directory now
    Backup,

    /// List snapshot files
    Snapshots {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Restore the data file from a snapshot
    Restore {
        /// Snapshot file to restore
        snapshot: PathBuf,

        /// Overwrite an existing data file
        #[arg(long)]
        force: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { schema, format } => {
            let config = cli.config.ok_or("--config required for inspect")?;
            commands::inspect::run(&config, schema, &format)?;
        }
        Commands::Dump { table } => {
            let config = cli.config.ok_or("--config required for dump")?;
            commands::dump::run(&config, table.as_deref())?;
        }
        Commands::Backup => {
            let config = cli.config.ok_or("--config required for backup")?;
            commands::backup::create(&config)?;
        }
        Commands::Snapshots { format } => {
            let config = cli.config.ok_or("--config required for snapshots")?;
            commands::backup::list(&config, &format)?;
        }
        Commands::Restore { snapshot, force } => {
            let config = cli.config.ok_or("--config required for restore")?;
            commands::backup::restore(&config, &snapshot, force)?;
        }
        Commands::Version => {
            println!("DataOrbit CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("DataOrbit Core v{}", dataorbit_core::VERSION);
        }
    }

    Ok(())
}
