//! Dashboard and payment history commands

use anyhow::Result;
use chrono::NaiveDate;
use debtwise_core::{Database, MonthlyTotal, MAX_HISTORY_MONTHS};

/// Width of the longest history bar
const BAR_WIDTH: f64 = 30.0;

pub fn cmd_dashboard(db: &Database, user: &str, json: bool) -> Result<()> {
    let ledger = db.load_ledger(user)?;
    let totals = ledger.aggregates();

    if json {
        let output = serde_json::json!({
            "total_debt": totals.total_debt,
            "total_paid": totals.total_paid,
            "total_monthly_payments": totals.total_monthly_payments,
            "debts": ledger.debts(),
            "recent_payments": ledger.payments().iter().take(5).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("╭─────────────────────────────────────────╮");
    println!("│          💳 Debtwise Dashboard          │");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Total Debt:             ${:.2}", totals.total_debt);
    println!("  Total Paid:             ${:.2}", totals.total_paid);
    println!("  Total Monthly Payments: ${:.2}", totals.total_monthly_payments);
    println!();

    if ledger.debts().is_empty() {
        println!("  No debts yet. Run 'debtwise debts add' to add one.");
        return Ok(());
    }

    println!("  Debts:");
    for debt in ledger.debts() {
        println!(
            "     {:<24} ${:>10.2}  {}%  ${:.2}/month",
            debt.name, debt.amount, debt.interest_rate, debt.monthly_payment
        );
    }

    // Stored payments are newest first
    let recent: Vec<_> = ledger.payments().iter().take(5).collect();
    if !recent.is_empty() {
        println!();
        println!("  Recent Payments:");
        for payment in recent {
            println!("     {}  ${:>10.2}", payment.date, payment.amount);
        }
    }
    println!();

    Ok(())
}

pub fn cmd_history(db: &Database, user: &str, today: NaiveDate, months: u32) -> Result<()> {
    let months = months.min(MAX_HISTORY_MONTHS);
    let history = db.load_ledger(user)?.payment_history(today, months);

    if history.is_empty() {
        println!("No months to show.");
        return Ok(());
    }

    println!();
    println!("  Payments per month:");
    for line in history_lines(&history) {
        println!("  {}", line);
    }
    println!();

    Ok(())
}

/// One text row per month with a bar scaled to the largest total
fn history_lines(history: &[MonthlyTotal]) -> Vec<String> {
    let max = history.iter().map(|m| m.total).fold(0.0_f64, f64::max);

    history
        .iter()
        .map(|m| {
            let width = if max > 0.0 {
                ((m.total / max) * BAR_WIDTH).round() as usize
            } else {
                0
            };
            format!(
                "{} {}  ${:>10.2}  {}",
                m.label,
                m.year,
                m.total,
                "█".repeat(width)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(label: &str, total: f64) -> MonthlyTotal {
        MonthlyTotal {
            year: 2024,
            month: 1,
            label: label.to_string(),
            total,
        }
    }

    #[test]
    fn test_history_lines_scale_to_largest_month() {
        let lines = history_lines(&[month("Jan", 50.0), month("Feb", 100.0), month("Mar", 0.0)]);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].matches('█').count(), 15);
        assert_eq!(lines[1].matches('█').count(), 30);
        assert_eq!(lines[2].matches('█').count(), 0);
        assert!(lines[1].starts_with("Feb 2024"));
    }

    #[test]
    fn test_history_lines_all_zero() {
        let lines = history_lines(&[month("Jan", 0.0)]);
        assert!(!lines[0].contains('█'));
    }
}
