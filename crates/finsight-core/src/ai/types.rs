//! Text-generation request types
//!
//! These types are backend-agnostic and used across all AI implementations.

use serde::Serialize;

/// A single text-generation call
///
/// Every call FinSight makes is deterministic sampling, so `temperature`
/// defaults to zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    /// Model override; backends use their configured model when `None`
    pub model: Option<String>,
    /// Optional system instructions (sent natively where the API supports it)
    pub system: Option<String>,
    /// The user prompt
    pub prompt: String,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            model: None,
            system: None,
            prompt: prompt.into(),
            temperature: 0.0,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_system(mut self, system: Option<String>) -> Self {
        self.system = system.filter(|s| !s.trim().is_empty());
        self
    }

    /// Model to send, falling back to the backend default
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model.as_deref().unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_to_zero_temperature() {
        let request = GenerationRequest::new("hello");
        assert_eq!(request.temperature, 0.0);
        assert!(request.model.is_none());
        assert_eq!(request.model_or("llama3.2"), "llama3.2");
    }

    #[test]
    fn test_blank_system_is_dropped() {
        let request = GenerationRequest::new("hello").with_system(Some("  ".to_string()));
        assert!(request.system.is_none());

        let request = GenerationRequest::new("hello").with_system(Some("Be brief.".to_string()));
        assert_eq!(request.system.as_deref(), Some("Be brief."));
    }
}
