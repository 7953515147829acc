//! Natural-language monthly insights
//!
//! Turns a monthly summary into a prompt and returns the model's prose. The
//! summary's own messages are returned directly when there is nothing to
//! describe, and a fixed sentence replaces the prose when the model fails.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, error};

use crate::aggregation::compute_monthly_summary;
use crate::ai::parsing::parse_insight;
use crate::ai::{AIBackend, AIClient};
use crate::error::{Error, Result};
use crate::models::{MonthlySummary, SpendingReport, Transaction};
use crate::prompts::{PromptId, PromptLibrary};

/// Returned whenever the backend cannot produce an insight
pub const FALLBACK_INSIGHT: &str = "Unable to generate monthly insight at the moment.";

/// Writes short prose about a month of spending
pub struct InsightComposer<B = AIClient> {
    backend: B,
    model: Option<String>,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl<B: AIBackend> InsightComposer<B> {
    pub fn new(backend: B) -> Self {
        Self::with_prompts(backend, Arc::new(RwLock::new(PromptLibrary::new())))
    }

    /// Share a prompt library with other components
    pub fn with_prompts(backend: B, prompts: Arc<RwLock<PromptLibrary>>) -> Self {
        Self {
            backend,
            model: None,
            prompts,
        }
    }

    /// Use a specific model instead of the backend default
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Summarize (year, month) and describe it
    pub async fn compose_monthly_insight(
        &self,
        ledger: &[Transaction],
        year: i32,
        month: u32,
    ) -> String {
        let summary = compute_monthly_summary(ledger, year, month);
        self.compose(&summary).await
    }

    /// Describe an already computed summary
    pub async fn compose(&self, summary: &MonthlySummary) -> String {
        let report = match summary {
            MonthlySummary::Summary(report) => report,
            other => return other.message().unwrap_or_default(),
        };

        match self.request(report).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                error!("Empty insight reply for {}", report.month);
                FALLBACK_INSIGHT.to_string()
            }
            Err(e) => {
                error!("Insight generation failed for {}: {}", report.month, e);
                FALLBACK_INSIGHT.to_string()
            }
        }
    }

    async fn request(&self, report: &SpendingReport) -> Result<Option<String>> {
        let total_spent = format!("{:.2}", report.total_spent);
        let top_amount = format!("{:.2}", report.top_category_amount);
        let largest_amount = format!("{:.2}", report.largest_expense.amount);
        let breakdown = report
            .category_breakdown
            .iter()
            .map(|c| format!("- {}: {:.2}", c.category, c.total))
            .collect::<Vec<_>>()
            .join("\n");

        let request = {
            let mut prompts = self
                .prompts
                .write()
                .map_err(|_| Error::Prompt("Failed to acquire prompt library lock".into()))?;
            let template = prompts.get(PromptId::MonthlyInsight)?;
            let mut vars = HashMap::new();
            vars.insert("month", report.month.as_str());
            vars.insert("total_spent", total_spent.as_str());
            vars.insert("top_category", report.top_category.as_str());
            vars.insert("top_category_amount", top_amount.as_str());
            vars.insert("largest_expense", report.largest_expense.description.as_str());
            vars.insert("largest_expense_amount", largest_amount.as_str());
            vars.insert("pct_change", report.pct_change_from_last_month.as_str());
            vars.insert("category_breakdown", breakdown.as_str());
            template.to_request(&vars).with_model(self.model.clone())
        };

        let reply = self.backend.generate(&request).await?;
        debug!("Insight reply for {}: {} chars", report.month, reply.len());

        Ok(parse_insight(&reply))
    }
}
