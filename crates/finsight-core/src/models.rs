//! Domain models for FinSight

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Whether a transaction brings money in or takes it out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EntryType {
    Income,
    #[default]
    Expense,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }

    /// Interpret a free-text guess from a language model.
    ///
    /// Anything that does not read as income is treated as an expense.
    pub fn from_guess(s: &str) -> Self {
        if s.trim().to_lowercase().starts_with("income") {
            Self::Income
        } else {
            Self::Expense
        }
    }
}

impl std::str::FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown entry type: {}", s)),
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One ledger row
///
/// `date` and `amount` are only ever missing on rows loaded from a backing
/// file whose values could not be parsed. New entries always carry both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: Option<NaiveDate>,
    pub category: String,
    pub note: String,
    pub entry_type: EntryType,
    /// Always non-negative; direction comes from `entry_type`
    pub amount: Option<Decimal>,
}

impl Transaction {
    /// Create a new transaction
    ///
    /// Category and note are trimmed. Negative amounts and dates outside
    /// years 100-9999 are rejected.
    pub fn new(
        date: NaiveDate,
        category: impl Into<String>,
        note: impl Into<String>,
        entry_type: EntryType,
        amount: Decimal,
    ) -> Result<Self> {
        Self {
            date: Some(date),
            category: category.into(),
            note: note.into(),
            entry_type,
            amount: Some(amount),
        }
        .into_new_entry()
    }

    pub fn is_expense(&self) -> bool {
        self.entry_type == EntryType::Expense
    }

    pub fn is_income(&self) -> bool {
        self.entry_type == EntryType::Income
    }

    /// Check a row about to be appended and bring it into the form it will
    /// have after a round trip through the backing file
    pub(crate) fn into_new_entry(mut self) -> Result<Self> {
        match self.amount {
            Some(amount) => validate_amount(amount)?,
            None => return Err(Error::InvalidData("New entries need an amount".into())),
        }
        match self.date {
            Some(date) => validate_date(date)?,
            None => return Err(Error::InvalidData("New entries need a date".into())),
        }

        self.category = self.category.trim().to_string();
        self.note = self.note.trim().to_string();
        Ok(self)
    }
}

fn validate_amount(amount: Decimal) -> Result<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::InvalidData(format!(
            "Amount must not be negative, got {:.2} (use the entry type for direction)",
            amount
        )));
    }
    Ok(())
}

/// Years the backing file can store as four digits
fn validate_date(date: NaiveDate) -> Result<()> {
    if !(100..=9999).contains(&date.year()) {
        return Err(Error::InvalidData(format!(
            "Date {} is out of range (years 100-9999)",
            date
        )));
    }
    Ok(())
}

/// Category label and entry type suggested for a description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Categorization {
    pub category: String,
    pub entry_type: EntryType,
}

impl Categorization {
    pub fn new(category: impl Into<String>, entry_type: EntryType) -> Self {
        Self {
            category: category.into(),
            entry_type,
        }
    }

    /// The safe answer used whenever the model cannot be asked or fails
    pub fn fallback() -> Self {
        Self::new("Other", EntryType::Expense)
    }
}

/// Total amount for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
}

/// The single biggest expense of a month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LargestExpense {
    pub description: String,
    pub amount: Decimal,
}

/// Expense figures for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingReport {
    /// "YYYY-MM"
    pub month: String,
    pub total_spent: Decimal,
    pub top_category: String,
    pub top_category_amount: Decimal,
    pub largest_expense: LargestExpense,
    /// "N/A" or a signed percentage such as "+400.0%"
    pub pct_change_from_last_month: String,
    /// Sorted by total, highest first
    pub category_breakdown: Vec<CategoryTotal>,
}

/// Result of a monthly summary computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MonthlySummary {
    /// No expenses recorded in the requested month
    NoData { month: String, message: String },
    /// Inputs were malformed or the computation failed
    Error {
        month: String,
        error: String,
        details: String,
    },
    Summary(SpendingReport),
}

impl MonthlySummary {
    pub fn month(&self) -> &str {
        match self {
            Self::NoData { month, .. } | Self::Error { month, .. } => month,
            Self::Summary(report) => &report.month,
        }
    }

    pub fn report(&self) -> Option<&SpendingReport> {
        match self {
            Self::Summary(report) => Some(report),
            _ => None,
        }
    }

    /// Human-readable text for the variants that carry no figures
    pub fn message(&self) -> Option<String> {
        match self {
            Self::NoData { message, .. } => Some(message.clone()),
            Self::Error { error, details, .. } => Some(format!("{}: {}", error, details)),
            Self::Summary(_) => None,
        }
    }
}
