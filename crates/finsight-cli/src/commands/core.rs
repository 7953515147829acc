//! Shared command utilities
//!
//! This module contains:
//! - `load_config` - Resolve configuration with CLI overrides
//! - `open_tracker` - Open the configured ledger and backend
//! - `resolve_month` - Default year/month to the current month

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use finsight_core::{AppConfig, FinanceTracker};

/// Load configuration, letting `--ledger` win over file and environment
pub fn load_config(config_path: Option<&Path>, ledger: Option<&Path>) -> Result<AppConfig> {
    let mut config = AppConfig::load(config_path).context("Failed to load configuration")?;
    if let Some(ledger) = ledger {
        config.ledger_path = ledger.to_path_buf();
    }
    Ok(config)
}

/// Open the ledger and backend described by `config`
pub fn open_tracker(config: &AppConfig) -> Result<FinanceTracker> {
    FinanceTracker::from_config(config)
        .with_context(|| format!("Failed to open ledger at {}", config.ledger_path.display()))
}

/// Fill in a missing year or month from today's date
pub fn resolve_month(year: Option<i32>, month: Option<u32>) -> (i32, u32) {
    let today = Local::now().date_naive();
    (
        year.unwrap_or_else(|| today.year()),
        month.unwrap_or_else(|| today.month()),
    )
}
