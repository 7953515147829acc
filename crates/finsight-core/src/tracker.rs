//! The `FinanceTracker` facade
//!
//! Ties the ledger store, aggregations, categorizer and insight composer
//! together behind the operations a front end needs. The backend is passed
//! in explicitly; the tracker never reaches for global state.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::aggregation;
use crate::ai::{AIBackend, AIClient};
use crate::categorize::Categorizer;
use crate::config::{AiConfig, AppConfig, TaskType};
use crate::error::{Error, Result};
use crate::insight::InsightComposer;
use crate::ledger::LedgerStore;
use crate::models::{Categorization, CategoryTotal, EntryType, MonthlySummary, Transaction};
use crate::prompts::PromptLibrary;

/// A user-entered transaction before defaults are filled in
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub date: NaiveDate,
    pub note: String,
    pub amount: Decimal,
    /// Suggested by the categorizer when `None`
    pub category: Option<String>,
    /// Suggested by the categorizer when `None`
    pub entry_type: Option<EntryType>,
}

impl NewEntry {
    pub fn new(date: NaiveDate, note: impl Into<String>, amount: Decimal) -> Self {
        Self {
            date,
            note: note.into(),
            amount,
            category: None,
            entry_type: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_entry_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = Some(entry_type);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.note.trim().is_empty() {
            return Err(Error::InvalidData("Note must not be empty".into()));
        }
        if self.amount <= Decimal::ZERO {
            return Err(Error::InvalidData(format!(
                "Amount must be greater than zero, got {}",
                self.amount
            )));
        }
        Ok(())
    }
}

/// Personal finance ledger with model-assisted categorization and insights
pub struct FinanceTracker<B = AIClient> {
    store: LedgerStore,
    backend: B,
    categorizer: Categorizer<B>,
    insights: InsightComposer<B>,
    /// Categorizations already asked for this session, keyed by note
    predictions: HashMap<String, Categorization>,
}

impl FinanceTracker<AIClient> {
    /// Open the configured ledger and connect the configured backend
    ///
    /// A backend that cannot be configured does not stop the tracker; model
    /// features then return their fallbacks.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let store = LedgerStore::open(&config.ledger_path)?;
        let client = AIClient::from_config(&config.ai).unwrap_or_else(|e| {
            warn!("AI backend unavailable: {}", e);
            AIClient::unavailable(e.to_string())
        });
        Ok(Self::new(store, client).with_task_models(&config.ai))
    }
}

impl<B: AIBackend + Clone> FinanceTracker<B> {
    pub fn new(store: LedgerStore, backend: B) -> Self {
        Self::with_prompt_library(store, backend, PromptLibrary::new())
    }

    /// Use a specific prompt library (e.g. embedded only, for tests)
    pub fn with_prompt_library(store: LedgerStore, backend: B, prompts: PromptLibrary) -> Self {
        let prompts = Arc::new(RwLock::new(prompts));
        Self {
            store,
            categorizer: Categorizer::with_prompts(backend.clone(), Arc::clone(&prompts)),
            insights: InsightComposer::with_prompts(backend.clone(), prompts),
            backend,
            predictions: HashMap::new(),
        }
    }

    /// Apply per-task model overrides
    pub fn with_task_models(mut self, ai: &AiConfig) -> Self {
        let categorization = ai.model_for_task(TaskType::Categorization).map(String::from);
        let insight = ai.model_for_task(TaskType::Insight).map(String::from);
        self.categorizer = self.categorizer.with_model(categorization);
        self.insights = self.insights.with_model(insight);
        self
    }

    /// Append a complete transaction
    pub fn append(&mut self, transaction: Transaction) -> Result<()> {
        let note = transaction.note.trim().to_string();
        self.store.append(transaction)?;
        if self.predictions.remove(&note).is_some() {
            debug!("Dropped cached categorization for '{}'", note);
        }
        Ok(())
    }

    /// Validate a user entry, fill missing fields from the categorizer, and
    /// append it
    ///
    /// Explicit category and entry type always win over suggestions.
    pub async fn add_entry(&mut self, entry: NewEntry) -> Result<Transaction> {
        entry.validate()?;
        let note = entry.note.trim().to_string();

        let category = entry.category.filter(|c| !c.trim().is_empty());
        let (category, entry_type) = match (category, entry.entry_type) {
            (Some(category), Some(entry_type)) => (category, entry_type),
            (category, entry_type) => {
                let suggestion = self.categorize(&note).await;
                (
                    category.unwrap_or(suggestion.category),
                    entry_type.unwrap_or(suggestion.entry_type),
                )
            }
        };

        let transaction = Transaction::new(entry.date, category, note, entry_type, entry.amount)?;
        self.append(transaction.clone())?;
        Ok(transaction)
    }

    /// Suggest a category and entry type, reusing earlier answers for the
    /// same note
    pub async fn categorize(&mut self, note: &str) -> Categorization {
        let note = note.trim();
        if let Some(cached) = self.predictions.get(note) {
            debug!("Using cached categorization for '{}'", note);
            return cached.clone();
        }

        let categorization = self.categorizer.categorize(note).await;
        if !note.is_empty() {
            self.predictions
                .insert(note.to_string(), categorization.clone());
        }
        categorization
    }

    /// The last `n` transactions in insertion order
    pub fn recent(&self, n: usize) -> &[Transaction] {
        self.store.recent(n)
    }

    pub fn all(&self) -> &[Transaction] {
        self.store.all()
    }

    pub fn net_balance(&self) -> Decimal {
        self.store.net_balance()
    }

    pub fn totals_by_category(&self, entry_type: EntryType) -> Vec<CategoryTotal> {
        self.store.totals_by_category(entry_type)
    }

    pub fn years(&self) -> Vec<i32> {
        self.store.years()
    }

    pub fn compute_monthly_summary(&self, year: i32, month: u32) -> MonthlySummary {
        aggregation::compute_monthly_summary(self.store.all(), year, month)
    }

    pub async fn compose_monthly_insight(&self, year: i32, month: u32) -> String {
        self.insights
            .compose_monthly_insight(self.store.all(), year, month)
            .await
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
