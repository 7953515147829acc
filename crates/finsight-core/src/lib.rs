//! FinSight Core Library
//!
//! Shared functionality for the FinSight personal finance ledger:
//! - CSV-backed ledger store with a lenient loader
//! - Aggregations (net balance, category totals, monthly summaries)
//! - Pluggable text-generation backends (Ollama, OpenAI-compatible, Gemini)
//! - Model-assisted categorization and monthly insights
//! - Prompt library for customizable prompts
//! - TOML configuration with environment overrides

pub mod aggregation;
pub mod ai;
pub mod categorize;
pub mod config;
pub mod error;
pub mod insight;
pub mod ledger;
pub mod models;
pub mod prompts;
pub mod tracker;

/// Test utilities including a mock text-generation server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use aggregation::{compute_monthly_summary, net_balance, totals_by_category};
pub use ai::{
    AIBackend, AIClient, GeminiBackend, GenerationRequest, MockBackend, MockReply, OllamaBackend,
    OpenAICompatibleBackend,
};
pub use categorize::Categorizer;
pub use config::{AiConfig, AppConfig, BackendKind, TaskType};
pub use error::{Error, Result};
pub use insight::{InsightComposer, FALLBACK_INSIGHT};
pub use ledger::{parse_date, LedgerStore};
pub use models::{
    Categorization, CategoryTotal, EntryType, LargestExpense, MonthlySummary, SpendingReport,
    Transaction,
};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
pub use tracker::{FinanceTracker, NewEntry};
