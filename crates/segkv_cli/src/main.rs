//! segkv CLI
//!
//! Command-line tools for segkv store directories.
//!
//! # Commands
//!
//! - `inspect` - Display segment layout and index statistics
//! - `verify` - Scan every segment and report corruption
//! - `compact` - Run a compaction to completion and report space savings

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// segkv command-line store tools.
#[derive(Parser)]
#[command(name = "segkv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display segment layout and index statistics
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Scan every segment and report corruption
    Verify,

    /// Run a compaction to completion
    Compact {
        /// Maximum segment size used when opening the store
        #[arg(short, long)]
        max_segment_size: Option<u64>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Store path required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Store path required for verify")?;
            commands::verify::run(&path)?;
        }
        Commands::Compact { max_segment_size } => {
            let path = cli.path.ok_or("Store path required for compact")?;
            commands::compact::run(&path, max_segment_size)?;
        }
        Commands::Version => {
            println!("segkv CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("segkv Core v{}", segkv_core::VERSION);
        }
    }

    Ok(())
}
