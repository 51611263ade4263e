//! # Sales Summary CLI (`sales-summary`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sales-summary serve` | Start the HTTP upload/download server |
//! | `sales-summary process <file.csv>` | Aggregate a local file into the result store |
//! | `sales-summary get <result_id>` | Print a stored summary |
//!
//! ## Examples
//!
//! ```bash
//! # Start the server with the default config path
//! sales-summary serve
//!
//! # Process a file in the background queue and wait for it
//! sales-summary --config ./config/sales-summary.toml process sales.csv --background
//!
//! # Show the per-department totals of a stored summary
//! sales-summary get summary_0192f0c4-....csv --totals
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sales_summary::{config, get, logging, process_cmd, server};

/// Sales Summary — aggregate per-department sales CSVs.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. When the file does not exist, built-in defaults are used.
#[derive(Parser)]
#[command(name = "sales-summary", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/sales-summary.toml")]
    config: PathBuf,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// Binds to `[server].bind` and serves `POST /upload`,
    /// `GET /results/{result_id}` and `GET /health`.
    Serve,

    /// Aggregate a local sales CSV and store the summary.
    ///
    /// Prints the same JSON descriptor `POST /upload` returns.
    Process {
        /// Path to a `.csv` file of `Department Name,Date,Number of Sales` rows.
        file: PathBuf,

        /// Run through the background queue instead of inline.
        #[arg(long)]
        background: bool,
    },

    /// Print a stored summary by result ID.
    Get {
        /// Result ID, e.g. `summary_<uuid>.csv`.
        id: String,

        /// Print parsed per-department totals instead of raw CSV.
        #[arg(long)]
        totals: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(&cli.log_level);

    let cfg = config::load_config_or_default(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Process { file, background } => {
            process_cmd::run_process(&cfg, &file, background).await?;
        }
        Commands::Get { id, totals } => {
            get::run_get(&cfg, &id, totals).await?;
        }
    }

    Ok(())
}
