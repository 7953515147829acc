//! Application configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/finsight/config/finsight.toml),
//!    or an explicit path
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Environment variables are applied on top of whichever file was used.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/finsight.toml");

const DEFAULT_LEDGER_PATH: &str = "finance_data.csv";

/// Task types for model selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    /// One-line "Category | Type" answers
    Categorization,
    /// Monthly prose insights
    Insight,
}

impl TaskType {
    /// Get the config key for this task type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Categorization => "categorization",
            Self::Insight => "insight",
        }
    }

    /// Get all task types
    pub fn all() -> &'static [TaskType] {
        &[Self::Categorization, Self::Insight]
    }
}

/// Which text-generation backend to talk to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    #[default]
    Ollama,
    OpenAICompatible,
    Gemini,
    Mock,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAICompatible => "openai_compatible",
            Self::Gemini => "gemini",
            Self::Mock => "mock",
        }
    }

    /// Environment variable conventionally holding this backend's API key
    fn default_api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::OpenAICompatible => Some("OPENAI_COMPATIBLE_API_KEY"),
            Self::Gemini => Some("GENAI_API_KEY"),
            Self::Ollama | Self::Mock => None,
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                Ok(Self::OpenAICompatible)
            }
            "gemini" | "google" => Ok(Self::Gemini),
            "mock" => Ok(Self::Mock),
            other => Err(format!("Unknown AI backend: {}", other)),
        }
    }
}

/// Text-generation backend settings
#[derive(Debug, Clone, Default)]
pub struct AiConfig {
    pub backend: BackendKind,
    /// Server URL; backend default when unset
    pub host: Option<String>,
    /// Default model; backend default when unset
    pub model: Option<String>,
    /// Resolved API key (never read from the config file directly)
    pub api_key: Option<String>,
    /// Name of the environment variable the API key is read from
    pub api_key_env: Option<String>,
    /// Per-task model overrides
    pub tasks: HashMap<TaskType, String>,
}

impl AiConfig {
    /// Model override for a task, if one is configured
    pub fn model_for_task(&self, task: TaskType) -> Option<&str> {
        self.tasks.get(&task).map(String::as_str)
    }
}

/// Resolved application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Backing CSV file for the ledger
    pub ledger_path: PathBuf,
    pub ai: AiConfig,
    /// File the config was read from (None = embedded defaults)
    pub source: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from(DEFAULT_LEDGER_PATH),
            ai: AiConfig::default(),
            source: None,
        }
    }
}

impl AppConfig {
    /// Load from file (explicit path, then default override location, then
    /// embedded defaults) and apply process environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = load_file(path)?;
        config.apply_env_from(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse config from TOML content, without environment overrides
    pub fn from_toml(content: &str) -> Result<Self> {
        parse_config(content)
    }

    /// Apply environment overrides using `lookup` to read variables
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = non_empty("FINSIGHT_LEDGER") {
            self.ledger_path = PathBuf::from(path);
        }

        if let Some(name) = non_empty("AI_BACKEND") {
            match name.parse::<BackendKind>() {
                Ok(kind) if kind != self.ai.backend => {
                    // Host and models from the file belong to the other backend
                    self.ai.backend = kind;
                    self.ai.host = None;
                    self.ai.model = None;
                    self.ai.api_key_env = None;
                    self.ai.tasks.clear();
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("{}, keeping {}", e, self.ai.backend.as_str()),
            }
        }

        let (host_var, model_var) = match self.ai.backend {
            BackendKind::Ollama => (Some("OLLAMA_HOST"), Some("OLLAMA_MODEL")),
            BackendKind::OpenAICompatible => (
                Some("OPENAI_COMPATIBLE_HOST"),
                Some("OPENAI_COMPATIBLE_MODEL"),
            ),
            BackendKind::Gemini => (None, Some("GEMINI_MODEL")),
            BackendKind::Mock => (None, None),
        };
        if let Some(host) = host_var.and_then(non_empty) {
            self.ai.host = Some(host);
        }
        if let Some(model) = model_var.and_then(non_empty) {
            self.ai.model = Some(model);
        }

        let key_env = self
            .ai
            .api_key_env
            .clone()
            .or_else(|| self.ai.backend.default_api_key_env().map(String::from));
        if let Some(ref key_env) = key_env {
            if let Some(key) = non_empty(key_env) {
                self.ai.api_key = Some(key);
            }
        }
        self.ai.api_key_env = key_env;
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("finsight").join("config").join("finsight.toml"))
}

/// Load configuration (override first, then default)
fn load_file(override_path: Option<&Path>) -> Result<AppConfig> {
    let candidate = match override_path {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };

    match candidate {
        Some(path) if path.exists() => {
            let content = fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
            let mut config = parse_config(&content)?;
            config.source = Some(path);
            Ok(config)
        }
        Some(path) if override_path.is_some() => Err(Error::Config(format!(
            "Config file not found: {}",
            path.display()
        ))),
        _ => parse_config(DEFAULT_CONFIG),
    }
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    ledger: Option<RawLedger>,
    ai: Option<RawAi>,
    tasks: Option<HashMap<String, RawTask>>,
}

#[derive(Debug, Deserialize)]
struct RawLedger {
    path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawAi {
    backend: Option<String>,
    host: Option<String>,
    model: Option<String>,
    api_key_env: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTask {
    model: Option<String>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<AppConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = AppConfig::default();

    if let Some(path) = raw.ledger.and_then(|l| l.path) {
        config.ledger_path = path;
    }

    if let Some(ai) = raw.ai {
        if let Some(backend) = ai.backend {
            config.ai.backend = backend.parse().map_err(Error::Config)?;
        }
        config.ai.host = ai.host;
        config.ai.model = ai.model;
        config.ai.api_key_env = ai.api_key_env;
    }

    if let Some(tasks) = raw.tasks {
        for (task_name, task_config) in tasks {
            let task = match task_name.as_str() {
                "categorization" => TaskType::Categorization,
                "insight" => TaskType::Insight,
                _ => continue, // Skip unknown task types
            };
            if let Some(model) = task_config.model {
                config.ai.tasks.insert(task, model);
            }
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_parse_default_config() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.ledger_path, PathBuf::from("finance_data.csv"));
        assert_eq!(config.ai.backend, BackendKind::Ollama);
        assert_eq!(config.ai.model.as_deref(), Some("llama3.2"));
        assert!(config.ai.tasks.is_empty());
    }

    #[test]
    fn test_parse_task_models() {
        let config = AppConfig::from_toml(
            r#"
            [ai]
            backend = "openai"
            host = "http://localhost:8000"

            [tasks.categorization]
            model = "small"

            [tasks.summarize]
            model = "ignored"
            "#,
        )
        .unwrap();

        assert_eq!(config.ai.backend, BackendKind::OpenAICompatible);
        assert_eq!(
            config.ai.model_for_task(TaskType::Categorization),
            Some("small")
        );
        assert_eq!(config.ai.model_for_task(TaskType::Insight), None);
        assert_eq!(config.ai.tasks.len(), 1);
    }

    #[test]
    fn test_parse_rejects_unknown_backend() {
        let result = AppConfig::from_toml("[ai]\nbackend = \"carrier-pigeon\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = parse_config(DEFAULT_CONFIG).unwrap();
        config.apply_env_from(env(&[
            ("FINSIGHT_LEDGER", "/tmp/ledger.csv"),
            ("OLLAMA_HOST", "http://gpu-box:11434"),
            ("OLLAMA_MODEL", "qwen2.5"),
        ]));

        assert_eq!(config.ledger_path, PathBuf::from("/tmp/ledger.csv"));
        assert_eq!(config.ai.host.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(config.ai.model.as_deref(), Some("qwen2.5"));
    }

    #[test]
    fn test_env_backend_switch_resets_backend_settings() {
        let mut config = AppConfig::from_toml(
            "[ai]\nbackend = \"ollama\"\nhost = \"http://localhost:11434\"\n[tasks.insight]\nmodel = \"llama3.2\"",
        )
        .unwrap();
        config.apply_env_from(env(&[
            ("AI_BACKEND", "gemini"),
            ("GENAI_API_KEY", "secret"),
        ]));

        assert_eq!(config.ai.backend, BackendKind::Gemini);
        assert_eq!(config.ai.host, None);
        assert!(config.ai.tasks.is_empty());
        assert_eq!(config.ai.api_key.as_deref(), Some("secret"));
        assert_eq!(config.ai.api_key_env.as_deref(), Some("GENAI_API_KEY"));
    }

    #[test]
    fn test_custom_api_key_env() {
        let mut config = AppConfig::from_toml(
            "[ai]\nbackend = \"openai_compatible\"\nhost = \"https://api.example.com\"\napi_key_env = \"MY_KEY\"",
        )
        .unwrap();
        config.apply_env_from(env(&[("MY_KEY", "k1"), ("OPENAI_COMPATIBLE_API_KEY", "k2")]));
        assert_eq!(config.ai.api_key.as_deref(), Some("k1"));
    }

    #[test]
    fn test_unknown_env_backend_is_ignored() {
        let mut config = parse_config(DEFAULT_CONFIG).unwrap();
        config.apply_env_from(env(&[("AI_BACKEND", "nope")]));
        assert_eq!(config.ai.backend, BackendKind::Ollama);
        assert_eq!(config.ai.model.as_deref(), Some("llama3.2"));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finsight.toml");
        std::fs::write(&path, "[ledger]\npath = \"mine.csv\"\n[ai]\nbackend = \"mock\"").unwrap();

        let config = load_file(Some(&path)).unwrap();
        assert_eq!(config.ledger_path, PathBuf::from("mine.csv"));
        assert_eq!(config.ai.backend, BackendKind::Mock);
        assert_eq!(config.source.as_deref(), Some(path.as_path()));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(load_file(Some(&missing)), Err(Error::Config(_))));
    }

    #[test]
    fn test_backend_kind_aliases() {
        assert_eq!(
            "vLLM".parse::<BackendKind>().unwrap(),
            BackendKind::OpenAICompatible
        );
        assert_eq!("gemini".parse::<BackendKind>().unwrap(), BackendKind::Gemini);
        assert!("".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_task_type_as_str() {
        assert_eq!(TaskType::Categorization.as_str(), "categorization");
        assert_eq!(TaskType::all().len(), 2);
    }
}
