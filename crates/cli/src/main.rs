//! keyhoist CLI
//!
//! Hoists hardcoded caption lookups into a generated constants class and
//! exports caption, route, UI string and package reports.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::Result;
use clap::{Parser, Subcommand};
use keyhoist::config::{CollisionPolicy, GenerationMode};
use keyhoist::{apply_overrides, format_add_outcome, format_summary, load_config};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "keyhoist")]
#[command(about = "Hoist caption lookups into generated constants and export reports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Root directory to process (overrides extract.root)
    #[arg(short, long, value_name = "DIR", global = true)]
    root: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract lookups, generate the constants class and rewrite call sites
    Hoist {
        /// Report what would change without writing any file
        #[arg(long)]
        dry_run: bool,

        /// How an existing constants file is written: append or overwrite
        #[arg(long, value_name = "MODE")]
        mode: Option<GenerationMode>,

        /// What to do when two keys map to one identifier: suffix or error
        #[arg(long, value_name = "POLICY")]
        on_collision: Option<CollisionPolicy>,
    },
    /// Extract lookups and write the extraction report only
    Extract,
    /// Append one constant to the constants class
    Add {
        /// Lookup category, e.g. Inspection
        category: String,
        /// Lookup key
        key: String,

        /// What to do when the key's identifier is taken: suffix or error
        #[arg(long, value_name = "POLICY")]
        on_collision: Option<CollisionPolicy>,
    },
    /// Search sources for API routes and UI strings
    Scan,
    /// Check referenced NuGet packages against the target framework
    Packages,
    /// Export the remote caption list
    Captions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let mut config = load_config(cli.config.as_deref(), cli.root.as_deref())?;

    match cli.command {
        Commands::Hoist {
            dry_run,
            mode,
            on_collision,
        } => {
            apply_overrides(&mut config, mode, on_collision);
            let report = keyhoist::hoist(&config, dry_run)?;
            println!("{}", format_summary(&report, dry_run));
        }
        Commands::Extract => {
            let report = keyhoist::extract(&config)?;
            for entry in report.mapping.entries() {
                println!("{} => {}", entry.raw_key, entry.identifier);
            }
            println!("{}", format_summary(&report, false));
        }
        Commands::Add {
            category,
            key,
            on_collision,
        } => {
            apply_overrides(&mut config, None, on_collision);
            let outcome = keyhoist::add(&config, &category, &key)?;
            println!(
                "{}",
                format_add_outcome(&outcome, &config.extract.constants_path())
            );
        }
        Commands::Scan => {
            let path = keyhoist::scan(&config)?;
            info!("Scan report written to {}", path.display());
        }
        Commands::Packages => {
            let path = keyhoist::packages(&config).await?;
            info!("Package report written to {}", path.display());
        }
        Commands::Captions => {
            let path = keyhoist::captions(&config).await?;
            info!("Caption report written to {}", path.display());
        }
    }

    Ok(())
}

/// Initialize logging system
///
/// `RUST_LOG` takes precedence over the default filter.
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // matches every keyhoist_* crate by target prefix
        tracing_subscriber::EnvFilter::new(format!("keyhoist={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
