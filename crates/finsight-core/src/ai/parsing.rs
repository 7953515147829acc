//! Parsing helpers for model replies
//!
//! Models are asked for strict formats but answer in free text, so these
//! helpers are forgiving about whitespace and stray markup.

use crate::models::{Categorization, EntryType};

/// Parse a "Category | Type" reply
///
/// Splits on the first `|`. Without a separator the whole reply is the
/// category and the entry type defaults to Expense. A blank category
/// becomes "Other".
pub fn parse_categorization(response: &str) -> Categorization {
    let response = response.trim();

    let (category, entry_type) = match response.split_once('|') {
        Some((category, entry_type)) => (
            category.trim(),
            EntryType::from_guess(strip_markup(entry_type)),
        ),
        None => (response, EntryType::Expense),
    };

    let category = strip_markup(category);
    if category.is_empty() {
        Categorization::new("Other", entry_type)
    } else {
        Categorization::new(category, entry_type)
    }
}

/// Remove emphasis and quote characters some models wrap labels in
pub(crate) fn strip_markup(s: &str) -> &str {
    s.trim_matches(|c: char| c == '*' || c == '`' || c == '"' || c == '\'' || c.is_whitespace())
}

/// Normalize a narrative reply; `None` when the model returned nothing usable
pub fn parse_insight(response: &str) -> Option<String> {
    let text = response.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
