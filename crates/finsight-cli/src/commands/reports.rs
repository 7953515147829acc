//! Report command implementations (monthly summary, insights)

use anyhow::Result;
use finsight_core::{AIBackend, FinanceTracker, MonthlySummary};

use super::{resolve_month, truncate};

pub fn cmd_summary<B: AIBackend + Clone>(
    tracker: &FinanceTracker<B>,
    year: Option<i32>,
    month: Option<u32>,
    json: bool,
) -> Result<()> {
    let (year, month) = resolve_month(year, month);
    let summary = tracker.compute_monthly_summary(year, month);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    match &summary {
        MonthlySummary::Summary(report) => {
            println!("📅 Spending summary for {}", report.month);
            println!("   ─────────────────────────────────────────");
            println!("   Total spent:        {:>10.2}", report.total_spent);
            println!(
                "   Top category:       {} ({:.2})",
                report.top_category, report.top_category_amount
            );
            println!(
                "   Largest expense:    {} ({:.2})",
                truncate(&report.largest_expense.description, 40),
                report.largest_expense.amount
            );
            println!(
                "   vs. last month:     {}",
                report.pct_change_from_last_month
            );
            println!();
            println!("   By category:");
            for entry in &report.category_breakdown {
                println!("     {:<20} {:>10.2}", truncate(&entry.category, 20), entry.total);
            }
        }
        MonthlySummary::NoData { month, message } => {
            println!("📅 {}: {}", month, message);
            print_available_years(tracker);
        }
        MonthlySummary::Error { month, error, details } => {
            println!("❌ {} ({}): {}", error, month, details);
        }
    }

    Ok(())
}

pub async fn cmd_insight<B: AIBackend + Clone>(
    tracker: &FinanceTracker<B>,
    year: Option<i32>,
    month: Option<u32>,
) -> Result<()> {
    let (year, month) = resolve_month(year, month);

    println!("🧠 Insights for {:04}-{:02}\n", year, month);
    let insight = tracker.compose_monthly_insight(year, month).await;
    println!("{}", insight);

    Ok(())
}

fn print_available_years<B: AIBackend + Clone>(tracker: &FinanceTracker<B>) {
    let years = tracker.years();
    if years.is_empty() {
        println!("   The ledger has no dated entries yet.");
    } else {
        let years: Vec<String> = years.iter().map(|y| y.to_string()).collect();
        println!("   Years with entries: {}", years.join(", "));
    }
}
