//! Aggregations over a ledger
//!
//! All functions take a read-only slice and never fail: rows with a missing
//! date or amount are skipped, and the monthly summary reports problems
//! through its `Error` variant instead of returning them.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{
    CategoryTotal, EntryType, LargestExpense, MonthlySummary, SpendingReport, Transaction,
};

pub const NO_DATA_MESSAGE: &str = "No expense data available for this month.";
pub const SUMMARY_ERROR: &str = "Failed to compute monthly summary";

/// Sum of income minus sum of expenses, skipping rows without an amount
pub fn net_balance(ledger: &[Transaction]) -> Decimal {
    ledger
        .iter()
        .filter_map(|tx| {
            tx.amount.map(|amount| match tx.entry_type {
                EntryType::Income => amount,
                EntryType::Expense => -amount,
            })
        })
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Per-category totals for one entry type, sorted by total descending
///
/// Categories with equal totals keep the order they first appear in.
pub fn totals_by_category(ledger: &[Transaction], entry_type: EntryType) -> Vec<CategoryTotal> {
    group_by_category(
        ledger
            .iter()
            .filter(|tx| tx.entry_type == entry_type)
            .filter_map(|tx| tx.amount.map(|amount| (tx.category.as_str(), amount))),
    )
}

fn group_by_category<'a>(rows: impl Iterator<Item = (&'a str, Decimal)>) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();
    for (category, amount) in rows {
        match totals.iter_mut().find(|t| t.category == category) {
            Some(total) => total.total = total.total.saturating_add(amount),
            None => totals.push(CategoryTotal {
                category: category.to_string(),
                total: amount,
            }),
        }
    }
    // sort_by is stable, so ties stay in first-seen order
    totals.sort_by(|a, b| b.total.cmp(&a.total));
    totals
}

/// Summarize expenses for one calendar month
pub fn compute_monthly_summary(ledger: &[Transaction], year: i32, month: u32) -> MonthlySummary {
    let label = month_label(year, month);
    match try_compute(ledger, year, month, &label) {
        Ok(summary) => summary,
        Err(details) => {
            debug!("Monthly summary for {} failed: {}", label, details);
            MonthlySummary::Error {
                month: label,
                error: SUMMARY_ERROR.to_string(),
                details,
            }
        }
    }
}

fn try_compute(
    ledger: &[Transaction],
    year: i32,
    month: u32,
    label: &str,
) -> std::result::Result<MonthlySummary, String> {
    if ledger.is_empty() {
        return Err("The ledger is empty".to_string());
    }
    if !(1..=12).contains(&month) {
        return Err(format!("Invalid month: {} (expected 1-12)", month));
    }

    let expenses: Vec<(&Transaction, Decimal)> = expenses_in(ledger, year, month).collect();
    if expenses.is_empty() {
        return Ok(MonthlySummary::NoData {
            month: label.to_string(),
            message: NO_DATA_MESSAGE.to_string(),
        });
    }

    let total_spent = checked_total(expenses.iter().map(|(_, amount)| *amount))?;

    let breakdown = group_by_category(
        expenses
            .iter()
            .map(|(tx, amount)| (tx.category.as_str(), *amount)),
    );
    let top = breakdown
        .first()
        .ok_or_else(|| "No categories in a non-empty month".to_string())?;

    // First row wins ties
    let (largest, largest_amount) = expenses
        .iter()
        .skip(1)
        .fold(expenses[0], |best, &candidate| {
            if candidate.1 > best.1 {
                candidate
            } else {
                best
            }
        });

    let (prev_year, prev_month) = previous_month(year, month);
    let prev_total = checked_total(expenses_in(ledger, prev_year, prev_month).map(|(_, a)| a))?;

    Ok(MonthlySummary::Summary(SpendingReport {
        month: label.to_string(),
        total_spent: round2(total_spent),
        top_category: top.category.clone(),
        top_category_amount: round2(top.total),
        largest_expense: LargestExpense {
            description: largest.note.clone(),
            amount: round2(largest_amount),
        },
        pct_change_from_last_month: format_pct_change(total_spent, prev_total),
        category_breakdown: breakdown
            .iter()
            .map(|t| CategoryTotal {
                category: t.category.clone(),
                total: round2(t.total),
            })
            .collect(),
    }))
}

/// Expense rows dated in (year, month), paired with their amount
fn expenses_in(
    ledger: &[Transaction],
    year: i32,
    month: u32,
) -> impl Iterator<Item = (&Transaction, Decimal)> {
    ledger.iter().filter_map(move |tx| match (tx.date, tx.amount) {
        (Some(date), Some(amount))
            if tx.is_expense() && date.year() == year && date.month() == month =>
        {
            Some((tx, amount))
        }
        _ => None,
    })
}

fn checked_total(mut amounts: impl Iterator<Item = Decimal>) -> std::result::Result<Decimal, String> {
    amounts
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
        .ok_or_else(|| "Monthly total is too large to represent".to_string())
}

/// The month before (year, month), rolling January back to December
pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month <= 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// "YYYY-MM" label for a month
pub fn month_label(year: i32, month: u32) -> String {
    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(first) => first.format("%Y-%m").to_string(),
        None => format!("{:04}-{:02}", year, month),
    }
}

/// Signed one-decimal percentage, or "N/A" without a previous total
pub fn format_pct_change(current: Decimal, previous: Decimal) -> String {
    if previous <= Decimal::ZERO {
        return "N/A".to_string();
    }
    let pct = (current - previous)
        .checked_div(previous)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED));
    match pct {
        Some(pct) => {
            let pct = pct.round_dp(1);
            let sign = if pct.is_sign_negative() { "" } else { "+" };
            format!("{}{:.1}%", sign, pct)
        }
        None => "N/A".to_string(),
    }
}

/// Round a currency figure to cents
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp(2)
}
