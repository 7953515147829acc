//! Transaction categorization via a text-generation backend
//!
//! Asks the model for a one-line "Category | Type" answer. Every failure
//! path ends in the same safe answer, ("Other", Expense), so adding an entry
//! never depends on the model being reachable.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, error};

use crate::ai::parsing::parse_categorization;
use crate::ai::{AIBackend, AIClient};
use crate::error::{Error, Result};
use crate::models::Categorization;
use crate::prompts::{PromptId, PromptLibrary};

/// Suggests a category and entry type for a transaction note
pub struct Categorizer<B = AIClient> {
    backend: B,
    model: Option<String>,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl<B: AIBackend> Categorizer<B> {
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

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Categorize a note, falling back to ("Other", Expense) on any failure
    ///
    /// Blank notes are answered without contacting the backend.
    pub async fn categorize(&self, note: &str) -> Categorization {
        let note = note.trim();
        if note.is_empty() {
            debug!("Empty note, skipping categorization");
            return Categorization::fallback();
        }

        match self.request(note).await {
            Ok(categorization) => categorization,
            Err(e) => {
                error!("Categorization failed for note '{}': {}", note, e);
                Categorization::fallback()
            }
        }
    }

    async fn request(&self, note: &str) -> Result<Categorization> {
        let request = {
            let mut prompts = self
                .prompts
                .write()
                .map_err(|_| Error::Prompt("Failed to acquire prompt library lock".into()))?;
            let template = prompts.get(PromptId::CategorizeTransaction)?;
            let mut vars = HashMap::new();
            vars.insert("note", note);
            template.to_request(&vars).with_model(self.model.clone())
        };

        let reply = self.backend.generate(&request).await?;
        debug!("Categorization reply for '{}': {}", note, reply.trim());

        Ok(parse_categorization(&reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::models::EntryType;

    fn categorizer(backend: MockBackend) -> Categorizer<MockBackend> {
        Categorizer::with_prompts(
            backend,
            Arc::new(RwLock::new(PromptLibrary::embedded_only())),
        )
    }

    #[tokio::test]
    async fn test_categorize_parses_reply() {
        let mock = MockBackend::with_reply("Food | Expense");
        let result = categorizer(mock.clone()).categorize("Lunch at cafe").await;
        assert_eq!(result, Categorization::new("Food", EntryType::Expense));

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prompt.contains("Note: Lunch at cafe"));
        assert!(requests[0]
            .prompt
            .contains("Food, Transportation, Entertainment, Other"));
        assert_eq!(requests[0].temperature, 0.0);
    }

    #[tokio::test]
    async fn test_categorize_without_separator() {
        let result = categorizer(MockBackend::with_reply("Groceries"))
            .categorize("Weekly shop")
            .await;
        assert_eq!(result, Categorization::new("Groceries", EntryType::Expense));
    }

    #[tokio::test]
    async fn test_categorize_income_guess() {
        let result = categorizer(MockBackend::new())
            .categorize("December salary")
            .await;
        assert_eq!(result.entry_type, EntryType::Income);
    }

    #[tokio::test]
    async fn test_empty_note_skips_backend() {
        let mock = MockBackend::new();
        let categorizer = categorizer(mock.clone());

        assert_eq!(categorizer.categorize("").await, Categorization::fallback());
        assert_eq!(categorizer.categorize("   ").await, Categorization::fallback());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_service_failure_falls_back() {
        let mock = MockBackend::failing("connection refused");
        let result = categorizer(mock.clone()).categorize("Uber ride").await;
        assert_eq!(result, Categorization::fallback());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_model_override_is_sent() {
        let mock = MockBackend::new();
        categorizer(mock.clone())
            .with_model(Some("small-model".to_string()))
            .categorize("Bus ticket")
            .await;
        assert_eq!(mock.requests()[0].model.as_deref(), Some("small-model"));
    }
}
