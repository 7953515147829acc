//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use finsight_core::EntryType;
use rust_decimal::Decimal;

/// FinSight - Personal finance ledger with AI categorization and insights
#[derive(Parser)]
#[command(name = "finsight")]
#[command(about = "Personal finance ledger with AI categorization and insights", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Ledger CSV path (overrides config and FINSIGHT_LEDGER)
    #[arg(long, global = true)]
    pub ledger: Option<PathBuf>,

    /// Config file (defaults to the data directory override, then built-in defaults)
    #[arg(long, env = "FINSIGHT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a transaction (category and type are suggested when omitted)
    Add {
        /// Description of the transaction
        note: String,

        /// Amount (positive; direction comes from --type)
        #[arg(short, long)]
        amount: Decimal,

        /// Date (defaults to today; most common layouts accepted)
        #[arg(short, long)]
        date: Option<String>,

        /// Category (suggested by the model if omitted)
        #[arg(short, long)]
        category: Option<String>,

        /// Income or expense (suggested by the model if omitted)
        #[arg(short = 't', long = "type", value_parser = parse_entry_type)]
        entry_type: Option<EntryType>,
    },

    /// Show the most recent transactions
    Recent {
        /// Number of transactions to show
        #[arg(short = 'n', long, default_value = "5")]
        limit: usize,
    },

    /// List all transactions
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show income minus expenses
    Balance,

    /// Show totals per category as a bar breakdown
    Totals {
        /// Which entries to total (income or expense)
        #[arg(short = 't', long = "type", default_value = "expense", value_parser = parse_entry_type)]
        entry_type: EntryType,
    },

    /// Summarize a month of spending
    Summary {
        /// Year (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Month 1-12 (defaults to the current month)
        #[arg(short, long)]
        month: Option<u32>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Suggest a category and type for a description
    Categorize {
        /// Transaction description
        note: String,
    },

    /// Generate natural-language insights for a month
    Insight {
        /// Year (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Month 1-12 (defaults to the current month)
        #[arg(short, long)]
        month: Option<u32>,
    },

    /// Export the ledger as CSV
    Export {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Inspect the categorization and insight prompt templates
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },

    /// Text-generation backend commands
    Ai {
        #[command(subcommand)]
        action: AiAction,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// Which command uses each template, its version and source
    List,

    /// Print a template's system and user text and the values it fills in
    Show {
        /// categorize_transaction or monthly_insight
        prompt_id: String,
    },

    /// Override directory and the override files found in it
    Path,
}

#[derive(Subcommand)]
pub enum AiAction {
    /// Show the configured backend and check that it responds
    Status,
}

fn parse_entry_type(s: &str) -> Result<EntryType, String> {
    s.parse()
}
