//! Ledger command implementations (add, recent, list, balance, totals, export)

use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use finsight_core::{parse_date, AIBackend, EntryType, FinanceTracker, NewEntry, Transaction};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::truncate;

pub const BAR_WIDTH: usize = 30;

pub async fn cmd_add<B: AIBackend + Clone>(
    tracker: &mut FinanceTracker<B>,
    note: &str,
    amount: Decimal,
    date: Option<&str>,
    category: Option<String>,
    entry_type: Option<EntryType>,
) -> Result<()> {
    let date = match date {
        Some(s) => parse_date(s).ok_or_else(|| anyhow!("Unrecognized date: {}", s))?,
        None => Local::now().date_naive(),
    };

    let mut entry = NewEntry::new(date, note, amount);
    entry.category = category;
    entry.entry_type = entry_type;

    let tx = tracker
        .add_entry(entry)
        .await
        .context("Failed to add transaction")?;

    println!(
        "✅ Added {} {:.2} on {} ({}): {}",
        tx.entry_type.as_str().to_lowercase(),
        amount,
        date,
        tx.category,
        tx.note
    );
    println!("   Balance: {:.2}", tracker.net_balance());

    Ok(())
}

pub fn cmd_recent<B: AIBackend + Clone>(tracker: &FinanceTracker<B>, limit: usize) -> Result<()> {
    let recent = tracker.recent(limit);
    if recent.is_empty() {
        println!("No transactions yet. Add one with: finsight add \"Lunch\" --amount 12.50");
        return Ok(());
    }

    println!("🧾 Last {} transaction(s):\n", recent.len());
    print_transactions(recent);
    Ok(())
}

pub fn cmd_list<B: AIBackend + Clone>(tracker: &FinanceTracker<B>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(tracker.all())?);
        return Ok(());
    }

    if tracker.all().is_empty() {
        println!("No transactions in {}", tracker.store().path().display());
        return Ok(());
    }

    print_transactions(tracker.all());
    println!("\n{} transaction(s)", tracker.all().len());
    Ok(())
}

pub fn cmd_balance<B: AIBackend + Clone>(tracker: &FinanceTracker<B>) -> Result<()> {
    let income: Decimal = tracker
        .totals_by_category(EntryType::Income)
        .iter()
        .map(|t| t.total)
        .sum();
    let expenses: Decimal = tracker
        .totals_by_category(EntryType::Expense)
        .iter()
        .map(|t| t.total)
        .sum();

    println!("💰 Balance");
    println!("   Income:   {:>12.2}", income);
    println!("   Expenses: {:>12.2}", expenses);
    println!("   ─────────────────────────");
    println!("   Net:      {:>12.2}", tracker.net_balance());
    Ok(())
}

pub fn cmd_totals<B: AIBackend + Clone>(
    tracker: &FinanceTracker<B>,
    entry_type: EntryType,
) -> Result<()> {
    let totals = tracker.totals_by_category(entry_type);
    if totals.is_empty() {
        println!("No {} entries yet.", entry_type.as_str().to_lowercase());
        return Ok(());
    }

    let grand_total: Decimal = totals.iter().map(|t| t.total).sum();
    let max = totals.first().map(|t| t.total).unwrap_or_default();

    println!("📊 {} by category\n", entry_type);
    for total in &totals {
        let share = total
            .total
            .checked_div(grand_total)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map(|pct| pct.round_dp(1))
            .unwrap_or_default();
        println!(
            "   {:<16} {:<width$} {:>10.2} {:>5.1}%",
            truncate(&total.category, 16),
            render_bar(total.total, max),
            total.total,
            share,
            width = BAR_WIDTH
        );
    }
    println!("\n   {:<16} {:<width$} {:>10.2}", "Total", "", grand_total, width = BAR_WIDTH);
    Ok(())
}

pub fn cmd_export<B: AIBackend + Clone>(
    tracker: &FinanceTracker<B>,
    output: Option<&Path>,
) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            tracker.store().write_csv(file)?;
            eprintln!(
                "✅ Exported {} transaction(s) to {}",
                tracker.all().len(),
                path.display()
            );
        }
        None => tracker.store().write_csv(io::stdout().lock())?,
    }
    Ok(())
}

/// Proportional bar for a value against the largest value
pub fn render_bar(value: Decimal, max: Decimal) -> String {
    if max <= Decimal::ZERO {
        return String::new();
    }
    let len = value
        .checked_div(max)
        .and_then(|ratio| ratio.checked_mul(Decimal::from(BAR_WIDTH)))
        .and_then(|scaled| scaled.round().to_usize())
        .unwrap_or(0);
    "█".repeat(len.clamp(1, BAR_WIDTH))
}

fn print_transactions(transactions: &[Transaction]) {
    println!(
        "{:<10}  {:<16}  {:<32}  {:<7}  {:>10}",
        "DATE", "CATEGORY", "NOTE", "TYPE", "AMOUNT"
    );
    println!("{}", "-".repeat(83));

    for tx in transactions {
        let date = tx
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let amount = tx
            .amount
            .map(|a| format!("{:.2}", a.round_dp(2)))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<10}  {:<16}  {:<32}  {:<7}  {:>10}",
            date,
            truncate(&tx.category, 16),
            truncate(&tx.note, 32),
            tx.entry_type.as_str(),
            amount
        );
    }
}

