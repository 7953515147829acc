//! Prompt template commands (list, show, overrides)

use anyhow::{anyhow, Result};
use finsight_core::prompts::{PromptId, PromptLibrary};

/// Commands that send a prompt to the backend
fn used_by(id: PromptId) -> &'static str {
    match id {
        PromptId::CategorizeTransaction => "add, categorize",
        PromptId::MonthlyInsight => "insight",
    }
}

/// `{{name}}` placeholders in a template, in order of first use
pub fn template_variables(content: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = content;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };
        let tag = after[..end].trim();
        // `{{#if name}}` opens a block, `{{/if}}` closes one
        let name = tag.strip_prefix("#if ").map(str::trim).unwrap_or(tag);
        let is_name = !name.is_empty() && !name.starts_with(['#', '/']);
        if is_name && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        rest = &after[end + 2..];
    }
    names
}

/// Table of the templates FinSight sends and where each one comes from
pub fn cmd_prompts_list(library: &mut PromptLibrary) -> Result<()> {
    println!("📝 Prompt templates\n");
    println!("   {:<24} {:<16} {:>3}  {}", "TEMPLATE", "USED BY", "V", "SOURCE");

    for &id in PromptId::all() {
        let prompt = library.get(id)?;
        let source = match &prompt.override_path {
            Some(path) if prompt.is_override => path.display().to_string(),
            _ => "built-in".to_string(),
        };
        println!(
            "   {:<24} {:<16} {:>3}  {}",
            id.as_str(),
            used_by(id),
            prompt.metadata.version,
            source
        );
    }

    println!();
    match library.override_dir() {
        Some(dir) => println!("   Overrides are read from {}", dir.display()),
        None => println!("   Overrides are disabled; only the built-in templates are used."),
    }
    Ok(())
}

/// Print one template split into the parts sent to the backend
pub fn cmd_prompts_show(library: &mut PromptLibrary, prompt_id: &str) -> Result<()> {
    let id = prompt_id.parse::<PromptId>().map_err(|e| {
        let known: Vec<&str> = PromptId::all().iter().map(|id| id.as_str()).collect();
        anyhow!("{} (known templates: {})", e, known.join(", "))
    })?;

    let prompt = library.get(id)?;
    println!(
        "📝 {} v{} ({}, used by: {})",
        prompt.metadata.id,
        prompt.metadata.version,
        prompt.metadata.task_type,
        used_by(id)
    );
    if let Some(path) = prompt.override_path.as_ref().filter(|_| prompt.is_override) {
        println!("   Overridden by {}", path.display());
    }

    let variables = template_variables(&prompt.content);
    if !variables.is_empty() {
        println!("   Fills in: {}", variables.join(", "));
    }

    match (prompt.system_section(), prompt.user_section()) {
        (system, Some(user)) => {
            if let Some(system) = system {
                println!("\n── System ──\n{}", system.trim());
            }
            println!("\n── User ──\n{}", user.trim());
        }
        _ => println!("\n{}", prompt.content.trim()),
    }
    Ok(())
}

/// Where override files go, and which ones are in place
pub fn cmd_prompts_path(library: &PromptLibrary) -> Result<()> {
    let Some(dir) = library.override_dir() else {
        println!("Prompt overrides are not available on this system (no local data directory).");
        return Ok(());
    };

    println!("{}", dir.display());
    if !dir.exists() {
        println!("   (not created yet)");
    }
    for &id in PromptId::all() {
        let marker = if library.has_override(id) { "✓" } else { "·" };
        println!("   {} {}.md", marker, id.as_str());
    }
    println!("\nA <template>.md file here replaces the built-in text of that template.");
    Ok(())
}
