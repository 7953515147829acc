//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (config loading, opening the tracker, month defaults)
//! - `transactions` - Ledger commands (add, recent, list, balance, totals, export)
//! - `reports` - Monthly summary and insight commands
//! - `ai` - Categorization and backend status commands
//! - `prompts` - Prompt library management commands

pub mod ai;
pub mod core;
pub mod prompts;
pub mod reports;
pub mod transactions;

// Re-export command functions for main.rs
pub use ai::*;
pub use self::core::*;
pub use prompts::*;
pub use reports::*;
pub use transactions::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
