//! CLI argument definitions for capewatch.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `market` | Run the pipeline and print the merged snapshot |
//! | `signal` | Run the pipeline and print the valuation signal |
//! | `ledger add` | Record a purchase priced from market history |
//! | `ledger delete` | Remove a purchase by id |
//! | `ledger list` | List purchases, newest first |
//! | `ledger summary` | Aggregate the ledger at the current price |
//!
//! Global options may appear before or after the subcommand.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// BTC valuation dashboard and DCA ledger.
#[derive(Debug, Parser)]
#[command(
    name = "capewatch",
    author,
    version,
    about = "BTC/NVDA/CAPE market snapshot, valuation signal, and purchase ledger"
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Emit debug logs on stderr (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Per-request upstream timeout in milliseconds.
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: Option<u64>,

    /// Directory holding the ledger file.
    #[arg(long, global = true)]
    pub ledger_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Table,
    /// Single JSON document.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch all series and print the merged snapshot.
    Market,
    /// Print the BUY/HOLD/SELL signal for the latest CAPE reading.
    Signal,
    /// Manage recorded purchases.
    #[command(subcommand)]
    Ledger(LedgerCommand),
}

#[derive(Debug, Subcommand)]
pub enum LedgerCommand {
    /// Record a purchase; the price comes from the nearest weekly close.
    Add(LedgerAddArgs),
    /// Remove a purchase.
    Delete(LedgerDeleteArgs),
    /// List purchases, newest first.
    List,
    /// Totals and ROI at the current price.
    Summary,
}

#[derive(Debug, Args)]
pub struct LedgerAddArgs {
    /// Purchase date (YYYY-MM-DD).
    #[arg(long)]
    pub date: String,

    /// Amount invested in quote currency.
    #[arg(long)]
    pub amount: f64,
}

#[derive(Debug, Args)]
pub struct LedgerDeleteArgs {
    /// Entry id as shown by `ledger list`.
    pub id: u64,
}
