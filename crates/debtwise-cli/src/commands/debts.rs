//! Debt management commands

use anyhow::{bail, Result};
use debtwise_core::{Database, NewDebt};

use super::truncate;

pub fn cmd_debts_list(db: &Database, user: &str) -> Result<()> {
    let debts = db.list_debts(user)?;

    if debts.is_empty() {
        println!("No debts found. Add one with:");
        println!("  debtwise debts add Visa --amount 1500 --monthly-payment 75 --rate 19.9");
        return Ok(());
    }

    println!();
    println!(
        "  {:>4}  {:<24} {:>12} {:>8} {:>10}",
        "ID", "Name", "Balance", "APR", "Monthly"
    );
    println!("  {}", "─".repeat(62));
    for debt in &debts {
        let marker = if debt.is_overpaid() { " ⚠️" } else { "" };
        println!(
            "  {:>4}  {:<24} {:>12.2} {:>7}% {:>10.2}{}",
            debt.id,
            truncate(&debt.name, 24),
            debt.amount,
            debt.interest_rate,
            debt.monthly_payment,
            marker
        );
    }
    println!();

    Ok(())
}

pub fn cmd_debts_add(
    db: &Database,
    user: &str,
    name: &str,
    amount: f64,
    monthly_payment: f64,
    rate: f64,
) -> Result<()> {
    let debt = db.create_debt(
        user,
        &NewDebt {
            name: name.to_string(),
            amount,
            monthly_payment,
            interest_rate: rate,
        },
    )?;

    println!(
        "✅ Added debt #{}: {} (${:.2} at {}%, ${:.2}/month)",
        debt.id, debt.name, debt.amount, debt.interest_rate, debt.monthly_payment
    );

    Ok(())
}

pub fn cmd_debts_show(db: &Database, user: &str, id: i64) -> Result<()> {
    let Some(debt) = db.get_debt(user, id)? else {
        bail!("Debt {} not found", id);
    };
    let payments = db.list_payments_for_debt(user, id)?;

    println!();
    println!("  💳 {} (#{})", debt.name, debt.id);
    println!("     Balance:         ${:.2}", debt.amount);
    println!("     Interest rate:   {}%", debt.interest_rate);
    println!("     Monthly payment: ${:.2}", debt.monthly_payment);
    println!("     Interest due:    ${:.2}/month", debt.interest_due());
    if debt.is_overpaid() {
        println!("     ⚠️  Balance is negative (overpaid)");
    }
    println!();

    if payments.is_empty() {
        println!("  No payments recorded.");
    } else {
        let total: f64 = payments.iter().map(|p| p.amount).sum();
        println!("  Payments ({}, ${:.2} total):", payments.len(), total);
        for payment in &payments {
            println!(
                "     {}  ${:>10.2}  (interest ${:.2}, principal ${:.2}){}",
                payment.date,
                payment.amount,
                payment.interest_amount,
                payment.capital_amount,
                payment
                    .note
                    .as_deref()
                    .map(|n| format!("  {}", n))
                    .unwrap_or_default()
            );
        }
    }
    println!();

    Ok(())
}

pub fn cmd_debts_delete(db: &Database, user: &str, id: i64) -> Result<()> {
    if !db.delete_debt(user, id)? {
        bail!("Debt {} not found", id);
    }

    println!("🗑️  Deleted debt #{} (payments kept)", id);
    Ok(())
}
