//! Mock backend for testing
//!
//! Provides configurable mock replies for text generation.
//! Useful for unit tests and development without a running LLM server.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::types::GenerationRequest;
use super::AIBackend;

/// How the mock answers a prompt
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Keyword-based answers shaped like a real model's
    Heuristic,
    /// Always return this text
    Fixed(String),
    /// Always fail with this message
    Fail(String),
}

/// Mock AI backend for testing
///
/// Records every request it receives; clones share the record.
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    reply: MockReply,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockBackend {
    /// Create a new mock backend (healthy, heuristic replies)
    pub fn new() -> Self {
        Self {
            healthy: true,
            reply: MockReply::Heuristic,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Always answer with `text`
    pub fn with_reply(text: impl Into<String>) -> Self {
        Self {
            reply: MockReply::Fixed(text.into()),
            ..Self::new()
        }
    }

    /// Fail every call, as an unreachable service would
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            healthy: false,
            reply: MockReply::Fail(message.into()),
            ..Self::new()
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        match &self.reply {
            MockReply::Heuristic => Ok(heuristic_reply(&request.prompt)),
            MockReply::Fixed(text) => Ok(text.clone()),
            MockReply::Fail(message) => Err(Error::Service(message.clone())),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

/// Answer a prompt the way a cooperative model would
///
/// These markers match the templates in prompts/*.md.
pub(crate) fn heuristic_reply(prompt: &str) -> String {
    if prompt.contains("Category | Type") {
        let note = field_value(prompt, "Note:").unwrap_or_default();
        let (category, entry_type) = classify_note(&note);
        format!("{} | {}", category, entry_type)
    } else if prompt.contains("Monthly spending summary") {
        let month = field_value(prompt, "Month:").unwrap_or_else(|| "this month".into());
        let total = field_value(prompt, "Total spent:").unwrap_or_else(|| "0.00".into());
        let top = field_value(prompt, "Top category:").unwrap_or_else(|| "Other".into());
        let change =
            field_value(prompt, "Change from last month:").unwrap_or_else(|| "N/A".into());
        format!(
            "- You spent {} in {}.\n- Your biggest category was {}.\n- Change from last month: {}.\n\nSuggestion: set a weekly limit for {}.",
            total, month, top, change, top
        )
    } else {
        "OK".to_string()
    }
}

fn field_value(prompt: &str, label: &str) -> Option<String> {
    prompt
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix(label))
        .map(|value| value.trim().to_string())
}

fn classify_note(note: &str) -> (&'static str, &'static str) {
    let lower = note.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let has = |keys: &[&str]| words.iter().any(|w| keys.contains(w));

    if has(&["salary", "paycheck", "pay", "wage", "wages", "bonus", "income", "dividend"]) {
        ("Other", "Income")
    } else if has(&[
        "uber", "lyft", "taxi", "bus", "train", "metro", "fuel", "gas", "flight", "ride", "parking",
    ]) {
        ("Transportation", "Expense")
    } else if has(&[
        "movie", "movies", "cinema", "netflix", "spotify", "concert", "game", "games", "tickets",
    ]) {
        ("Entertainment", "Expense")
    } else if has(&[
        "lunch", "dinner", "breakfast", "restaurant", "grocery", "groceries", "coffee", "pizza",
        "shawarma", "snack", "snacks", "food",
    ]) {
        ("Food", "Expense")
    } else {
        ("Other", "Expense")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_categorization_reply() {
        let mock = MockBackend::new();
        let reply = mock
            .generate(&GenerationRequest::new(
                "Note: Shawarma at Domino's\nOutput format: Category | Type",
            ))
            .await
            .unwrap();
        assert_eq!(reply, "Food | Expense");
    }

    #[tokio::test]
    async fn test_mock_income_reply() {
        let mock = MockBackend::new();
        let reply = mock
            .generate(&GenerationRequest::new(
                "Note: December Paycheck\nOutput format: Category | Type",
            ))
            .await
            .unwrap();
        assert_eq!(reply, "Other | Income");
    }

    #[tokio::test]
    async fn test_mock_records_requests_across_clones() {
        let mock = MockBackend::with_reply("fixed");
        let clone = mock.clone();
        let reply = clone.generate(&GenerationRequest::new("a")).await.unwrap();
        assert_eq!(reply, "fixed");
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.requests()[0].prompt, "a");
    }

    #[tokio::test]
    async fn test_mock_failing() {
        let mock = MockBackend::failing("boom");
        let result = mock.generate(&GenerationRequest::new("a")).await;
        assert!(matches!(result, Err(Error::Service(ref m)) if m == "boom"));
        assert!(!mock.health_check().await);
    }

    #[test]
    fn test_heuristic_insight_reply() {
        let prompt = "Monthly spending summary\nMonth: 2025-01\nTotal spent: 50.00\nTop category: Food (50.00)\nChange from last month: +400.0%";
        let reply = heuristic_reply(prompt);
        assert!(reply.contains("You spent 50.00 in 2025-01"));
        assert!(reply.contains("+400.0%"));
        assert_eq!(reply.lines().filter(|l| l.starts_with("- ")).count(), 3);
    }
}
