//! Text-generation command implementations (categorize, backend status)

use anyhow::Result;
use finsight_core::{AIBackend, AIClient, AppConfig, FinanceTracker, TaskType};

/// Ask the backend for a category and entry type
pub async fn cmd_categorize<B: AIBackend + Clone>(
    tracker: &mut FinanceTracker<B>,
    note: &str,
) -> Result<()> {
    let result = tracker.categorize(note).await;
    println!("  \"{}\" → {} | {}", note, result.category, result.entry_type);
    Ok(())
}

/// Show the configured backend and check that it responds
pub async fn cmd_ai_status(config: &AppConfig) -> Result<()> {
    println!("🤖 Text generation backend");
    println!("   ─────────────────────────────────────────");

    match &config.source {
        Some(path) => println!("   Config: {}", path.display()),
        None => println!("   Config: (built-in defaults)"),
    }

    let client = match AIClient::from_config(&config.ai) {
        Ok(client) => client,
        Err(e) => {
            println!("   Backend: {}", config.ai.backend.as_str());
            println!("   ❌ Not configured: {}", e);
            println!();
            println!("   Categorization falls back to \"Other | Expense\" until this is fixed.");
            return Ok(());
        }
    };

    println!("   Backend: {}", client.kind());
    if !client.host().is_empty() {
        println!("   Host: {}", client.host());
    }
    println!("   Model: {}", client.model());
    for task in TaskType::all() {
        if let Some(model) = config.ai.model_for_task(*task) {
            println!("   Model ({}): {}", task.as_str(), model);
        }
    }
    if let Some(ref key_env) = config.ai.api_key_env {
        let state = if config.ai.api_key.is_some() {
            "set"
        } else {
            "not set"
        };
        println!("   API key ({}): {}", key_env, state);
    }

    print!("   Health: ");
    if client.health_check().await {
        println!("✅ Reachable");
    } else {
        println!("❌ Unreachable");
        println!();
        println!("   Categorization and insights will use their fallback answers.");
    }

    Ok(())
}
