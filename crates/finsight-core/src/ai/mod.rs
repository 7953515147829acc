//! Pluggable text-generation backend abstraction
//!
//! FinSight only ever needs one operation from a language model: send a
//! prompt, get text back. This module provides a backend-agnostic interface
//! for that call.
//!
//! # Architecture
//!
//! - `AIBackend` trait: defines the interface for all backends
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `OpenAICompatibleBackend`,
//!   `GeminiBackend`, `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! let client = AIClient::from_config(&config.ai)?;
//! let text = client.generate(&GenerationRequest::new("Hello")).await?;
//! ```
//!
//! # Configuration
//!
//! Environment variables (override the config file):
//! - `AI_BACKEND`: Backend to use (ollama, openai_compatible, gemini, mock). Default: ollama
//! - `OLLAMA_HOST` / `OLLAMA_MODEL`
//! - `OPENAI_COMPATIBLE_HOST` / `OPENAI_COMPATIBLE_MODEL` / `OPENAI_COMPATIBLE_API_KEY`
//! - `GENAI_API_KEY` / `GEMINI_MODEL`

mod gemini;
mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;
pub mod types;

pub use gemini::GeminiBackend;
pub use mock::{MockBackend, MockReply};
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use types::*;

pub(crate) use mock::heuristic_reply;

use async_trait::async_trait;

use crate::config::{AiConfig, BackendKind};
use crate::error::{Error, Result};

/// Trait defining the interface for all text-generation backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Send one prompt and return the model's text reply
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Get the default model name
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// OpenAI-compatible backend (vLLM, LocalAI, llama-server, hosted APIs, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Google Gemini (generateContent API)
    Gemini(GeminiBackend),
    /// Mock backend for testing and offline use
    Mock(MockBackend),
    /// No backend could be configured; every call fails with the stored reason
    Unavailable(String),
}

impl AIClient {
    /// Create an AI client from resolved configuration
    pub fn from_config(config: &AiConfig) -> Result<Self> {
        match config.backend {
            BackendKind::Ollama => {
                let host = config.host.as_deref().unwrap_or(OllamaBackend::DEFAULT_HOST);
                let model = config
                    .model
                    .as_deref()
                    .unwrap_or(OllamaBackend::DEFAULT_MODEL);
                Ok(AIClient::Ollama(OllamaBackend::new(host, model)))
            }
            BackendKind::OpenAICompatible => {
                let host = config.host.as_deref().ok_or_else(|| {
                    Error::Config("openai_compatible backend requires a host".into())
                })?;
                let model = config
                    .model
                    .as_deref()
                    .unwrap_or(OpenAICompatibleBackend::DEFAULT_MODEL);
                let backend = match config.api_key.as_deref() {
                    Some(key) => OpenAICompatibleBackend::with_api_key(host, model, key),
                    None => OpenAICompatibleBackend::new(host, model),
                };
                Ok(AIClient::OpenAICompatible(backend))
            }
            BackendKind::Gemini => {
                let api_key = config.api_key.as_deref().ok_or_else(|| {
                    Error::Config(format!(
                        "gemini backend requires an API key (set {})",
                        config.api_key_env.as_deref().unwrap_or("GENAI_API_KEY")
                    ))
                })?;
                let host = config.host.as_deref().unwrap_or(GeminiBackend::DEFAULT_HOST);
                let model = config
                    .model
                    .as_deref()
                    .unwrap_or(GeminiBackend::DEFAULT_MODEL);
                Ok(AIClient::Gemini(GeminiBackend::with_host(host, model, api_key)))
            }
            BackendKind::Mock => Ok(AIClient::Mock(MockBackend::new())),
        }
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Create a placeholder client that fails every call
    pub fn unavailable(reason: impl Into<String>) -> Self {
        AIClient::Unavailable(reason.into())
    }

    /// Short backend name for display
    pub fn kind(&self) -> &'static str {
        match self {
            AIClient::Ollama(_) => "ollama",
            AIClient::OpenAICompatible(_) => "openai_compatible",
            AIClient::Gemini(_) => "gemini",
            AIClient::Mock(_) => "mock",
            AIClient::Unavailable(_) => "unavailable",
        }
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        match self {
            AIClient::Ollama(b) => b.generate(request).await,
            AIClient::OpenAICompatible(b) => b.generate(request).await,
            AIClient::Gemini(b) => b.generate(request).await,
            AIClient::Mock(b) => b.generate(request).await,
            AIClient::Unavailable(reason) => Err(Error::Service(reason.clone())),
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Gemini(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
            AIClient::Unavailable(_) => false,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Gemini(b) => b.model(),
            AIClient::Mock(b) => b.model(),
            AIClient::Unavailable(_) => "none",
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Gemini(b) => b.host(),
            AIClient::Mock(b) => b.host(),
            AIClient::Unavailable(_) => "",
        }
    }
}
