//! CLI module for folio
//!
//! Command-line interface for the portfolio reconstruction pipeline.
//! It uses clap for argument parsing and provides a structured command
//! pattern for report generation and cache maintenance.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

use crate::data_paths::{DataPaths, DEFAULT_DATA_DIR};
use crate::logging::{self, LoggingConfig};

use commands::cache::{CacheArgs, CacheCommand};
use commands::prices::{PricesArgs, PricesCommand};
use commands::report::{ReportArgs, ReportCommand};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Brokerage ledger portfolio reconstruction", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory path (default: ./data)
    #[arg(long, global = true, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconstruct portfolios and write report data products
    Report(ReportArgs),

    /// Refresh cached prices for explicit symbols
    Prices(PricesArgs),

    /// Inspect or clear the price cache
    Cache(CacheArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let data_paths = DataPaths::new(&self.data_dir);

        // Ensure all directories exist
        data_paths.ensure_directories()?;

        logging::init_logging(LoggingConfig::new(data_paths.clone(), self.verbose > 0))?;

        match self.command {
            Commands::Report(args) => ReportCommand::new(args).execute(data_paths).await,
            Commands::Prices(args) => PricesCommand::new(args).execute(data_paths).await,
            Commands::Cache(args) => CacheCommand::new(args).execute(data_paths).await,
        }
    }
}
