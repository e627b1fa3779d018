//! Payment commands

use anyhow::Result;
use chrono::NaiveDate;
use debtwise_core::{Database, MissingDebtPolicy, NewPayment};

use super::truncate;

/// Arguments for `payments add`
pub struct PaymentArgs {
    pub debt_id: i64,
    pub amount: f64,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub key: Option<String>,
}

pub fn cmd_payments_list(
    db: &Database,
    user: &str,
    debt_id: Option<i64>,
    limit: usize,
) -> Result<()> {
    let payments = match debt_id {
        Some(id) => db.list_payments_for_debt(user, id)?,
        None => db.list_payments(user)?,
    };

    if payments.is_empty() {
        println!("No payments found.");
        return Ok(());
    }

    println!();
    println!(
        "  {:>4}  {:<10}  {:>5}  {:>10}  {:>10}  {:>10}  Note",
        "ID", "Date", "Debt", "Amount", "Interest", "Principal"
    );
    println!("  {}", "─".repeat(70));
    for payment in payments.iter().take(limit) {
        println!(
            "  {:>4}  {:<10}  {:>5}  {:>10.2}  {:>10.2}  {:>10.2}  {}",
            payment.id,
            payment.date,
            payment.debt_id,
            payment.amount,
            payment.interest_amount,
            payment.capital_amount,
            truncate(payment.note.as_deref().unwrap_or(""), 30)
        );
    }
    if payments.len() > limit {
        println!("  ... and {} more", payments.len() - limit);
    }
    println!();

    Ok(())
}

pub fn cmd_payments_add(
    db: &Database,
    user: &str,
    args: PaymentArgs,
    policy: MissingDebtPolicy,
) -> Result<()> {
    let mut new_payment = NewPayment::new(args.debt_id, args.amount, args.date);
    if let Some(note) = args.note {
        new_payment = new_payment.with_note(note);
    }
    if let Some(key) = args.key {
        new_payment = new_payment.with_idempotency_key(key);
    }

    let payment = db.record_payment(user, &new_payment, policy)?;

    println!(
        "✅ Recorded payment #{}: ${:.2} on {} (interest ${:.2}, principal ${:.2})",
        payment.id, payment.amount, payment.date, payment.interest_amount, payment.capital_amount
    );

    match db.get_debt(user, payment.debt_id)? {
        Some(debt) => {
            println!("   {} balance: ${:.2}", debt.name, debt.amount);
            if debt.is_overpaid() {
                println!("   ⚠️  Balance is negative (overpaid)");
            }
        }
        None => println!(
            "   ⚠️  Debt #{} does not exist; full amount recorded as principal",
            payment.debt_id
        ),
    }

    Ok(())
}
