//! sharefetch - extract shared tables into CSV files
//!
//! Commands:
//! - `extract` - Fetch every table matching a pattern and write it as CSV
//! - `list` - Show the tables visible through the sharing profile

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{extract, list};

/// sharefetch - extract tables from a Delta Sharing share into CSV files
#[derive(Parser)]
#[command(name = "sharefetch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract shared tables into CSV files", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SHAREFETCH_CONFIG")]
    config: Option<String>,

    /// Sharing profile (path or URL)
    #[arg(long, env = "CONFIG_PATH")]
    profile: Option<String>,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch matching tables and write them as CSV
    Extract {
        /// Table name pattern (regex)
        #[arg(short, long)]
        pattern: Option<String>,

        /// Existing directory receiving the CSV files
        #[arg(long)]
        output_dir: Option<String>,

        /// Process tables one at a time
        #[arg(long)]
        sequential: bool,

        /// Exit non-zero if any table fails
        #[arg(long)]
        fail_on_error: bool,

        /// Dry run - show matching tables without fetching
        #[arg(long)]
        dry_run: bool,
    },

    /// List tables visible through the profile
    List {
        /// Filter by name pattern (regex)
        #[arg(short, long)]
        pattern: Option<String>,

        /// Output format (table, json, yaml)
        #[arg(short, long, default_value = "table")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // CONFIG_PATH may come from a .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup tracing based on verbosity
    let filter = match cli.verbose {
        0 => "warn,sharefetch=info",
        1 => "info,sharefetch=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = config::load_config(cli.config.as_deref(), cli.profile.as_deref())?;

    match cli.command {
        Commands::Extract {
            pattern,
            output_dir,
            sequential,
            fail_on_error,
            dry_run,
        } => {
            let args = extract::ExtractArgs {
                pattern,
                output_dir,
                sequential,
                fail_on_error,
                dry_run,
            };
            extract::run(&config, args).await?;
        }

        Commands::List { pattern, output } => {
            list::run(&config, pattern.as_deref(), &output).await?;
        }
    }

    Ok(())
}
