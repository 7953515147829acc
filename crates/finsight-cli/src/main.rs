//! FinSight CLI - Personal finance ledger
//!
//! Usage:
//!   finsight add "Lunch" --amount 12.50      Add a transaction
//!   finsight recent                          Show the latest entries
//!   finsight summary --year 2025 --month 1   Monthly spending summary
//!   finsight insight                         AI insights for this month

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use finsight_core::PromptLibrary;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    // API keys usually live in .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config.as_deref(), cli.ledger.as_deref())?;

    match cli.command {
        Commands::Add {
            note,
            amount,
            date,
            category,
            entry_type,
        } => {
            let mut tracker = commands::open_tracker(&config)?;
            commands::cmd_add(
                &mut tracker,
                &note,
                amount,
                date.as_deref(),
                category,
                entry_type,
            )
            .await
        }
        Commands::Recent { limit } => commands::cmd_recent(&commands::open_tracker(&config)?, limit),
        Commands::List { json } => commands::cmd_list(&commands::open_tracker(&config)?, json),
        Commands::Balance => commands::cmd_balance(&commands::open_tracker(&config)?),
        Commands::Totals { entry_type } => {
            commands::cmd_totals(&commands::open_tracker(&config)?, entry_type)
        }
        Commands::Summary { year, month, json } => {
            commands::cmd_summary(&commands::open_tracker(&config)?, year, month, json)
        }
        Commands::Categorize { note } => {
            let mut tracker = commands::open_tracker(&config)?;
            commands::cmd_categorize(&mut tracker, &note).await
        }
        Commands::Insight { year, month } => {
            commands::cmd_insight(&commands::open_tracker(&config)?, year, month).await
        }
        Commands::Export { output } => {
            commands::cmd_export(&commands::open_tracker(&config)?, output.as_deref())
        }
        Commands::Prompts { action } => {
            let mut library = PromptLibrary::new();
            match action {
                Some(PromptsAction::List) | None => commands::cmd_prompts_list(&mut library),
                Some(PromptsAction::Show { prompt_id }) => {
                    commands::cmd_prompts_show(&mut library, &prompt_id)
                }
                Some(PromptsAction::Path) => commands::cmd_prompts_path(&library),
            }
        }
        Commands::Ai { action } => match action {
            AiAction::Status => commands::cmd_ai_status(&config).await,
        },
    }
}
