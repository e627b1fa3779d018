//! Integration tests for debtwise-core
//!
//! These tests exercise the record payment → dashboard → advisor workflow.

use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;
use debtwise_core::{
    format_financial_context, AdvisorySession, ChatRole, Database, Error, FinancialContext,
    Ledger, MissingDebtPolicy, MockBackend, NewDebt, NewPayment,
};

const USER: &str = "tester@example.com";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn card(name: &str, amount: f64, rate: f64) -> NewDebt {
    NewDebt {
        name: name.into(),
        amount,
        monthly_payment: 100.0,
        interest_rate: rate,
    }
}

// =============================================================================
// Ledger + Database
// =============================================================================

#[test]
fn test_database_and_memory_ledger_agree() {
    let db = Database::in_memory().expect("Failed to create database");
    let mut ledger = Ledger::new();

    let stored = db.create_debt(USER, &card("Visa", 1000.0, 12.0)).unwrap();
    let local = ledger.add_debt(card("Visa", 1000.0, 12.0)).unwrap();
    assert_eq!(stored.id, local.id);

    for (m, amount) in [(1, 100.0), (2, 5.0), (3, 300.0)] {
        let submission = NewPayment::new(stored.id, amount, date(2024, m, 15));
        let a = db
            .record_payment(USER, &submission, MissingDebtPolicy::default())
            .unwrap();
        let b = ledger.record_payment(submission).unwrap();
        assert_eq!(a.interest_amount, b.interest_amount);
        assert_eq!(a.capital_amount, b.capital_amount);
    }

    let from_db = db.load_ledger(USER).unwrap().aggregates();
    assert_eq!(from_db, ledger.aggregates());
}

#[test]
fn test_concurrent_payments_serialize() {
    let db = Arc::new(Database::in_memory().expect("Failed to create database"));
    let debt = db.create_debt(USER, &card("Loan", 5000.0, 6.0)).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let db = db.clone();
            thread::spawn(move || {
                db.record_payment(
                    USER,
                    &NewPayment::new(debt.id, 50.0 + i as f64, date(2024, 1, 1 + i)),
                    MissingDebtPolicy::default(),
                )
                .unwrap()
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let payments = db.list_payments(USER).unwrap();
    assert_eq!(payments.len(), 8);

    let capital: f64 = payments.iter().map(|p| p.capital_amount).sum();
    let balance = db.get_debt(USER, debt.id).unwrap().unwrap().amount;
    assert!((5000.0 - capital - balance).abs() < 1e-6);
}

#[test]
fn test_overpayment_leaves_negative_balance() {
    let db = Database::in_memory().unwrap();
    let debt = db.create_debt(USER, &card("Store card", 50.0, 0.0)).unwrap();

    db.record_payment(
        USER,
        &NewPayment::new(debt.id, 80.0, date(2024, 1, 1)),
        MissingDebtPolicy::default(),
    )
    .unwrap();

    let debt = db.get_debt(USER, debt.id).unwrap().unwrap();
    assert_eq!(debt.amount, -30.0);
    assert!(debt.is_overpaid());
}

// =============================================================================
// Advisor workflow
// =============================================================================

#[test]
fn test_empty_report() {
    let ledger = Ledger::new();
    let text = ledger.financial_context().render();

    assert!(text.contains("Total Debt: $0.00"));
    assert!(text.ends_with("Current Debts:\n"));
    assert!(!text.contains("Recent Payments"));
}

#[test]
fn test_context_from_database() {
    let db = Database::in_memory().unwrap();
    let debt = db.create_debt(USER, &card("Visa", 1000.0, 12.0)).unwrap();
    db.record_payment(
        USER,
        &NewPayment::new(debt.id, 100.0, date(2024, 2, 1)).with_note("extra"),
        MissingDebtPolicy::default(),
    )
    .unwrap();

    let ledger = db.load_ledger(USER).unwrap();
    let text = format_financial_context(&ledger.aggregates(), ledger.debts(), ledger.payments());

    assert!(text.contains("- Total Debt: $910.00\n"));
    assert!(text.contains("- Visa: $910.00 (12% interest, $100.00/month)\n"));
    assert!(text.contains("- $100.00 on 2/1/2024 (extra)\n"));
    assert_eq!(text, FinancialContext::from(&ledger).render());
}

#[tokio::test]
async fn test_advisor_session_persisted_log() {
    let db = Database::in_memory().unwrap();
    let backend = MockBackend::with_reply("Pay the Visa first.");
    let context = db.load_ledger(USER).unwrap().financial_context().render();

    let mut session = AdvisorySession::new();
    session
        .send(&backend, "Where do I start?", Some(&context))
        .await
        .unwrap();
    for message in session.log() {
        db.append_chat_message(USER, message).unwrap();
    }

    let stored = db.list_chat_messages(USER).unwrap();
    let roles: Vec<ChatRole> = stored.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![ChatRole::User, ChatRole::Assistant]);
}

#[tokio::test]
async fn test_advisor_failure_records_system_entry() {
    let backend = MockBackend::failing("upstream timed out");
    let mut session = AdvisorySession::new();

    let err = session.send(&backend, "Help", None).await.unwrap_err();

    assert!(matches!(err, Error::AdvisoryUnavailable(_)));
    let assistant = session
        .log()
        .iter()
        .filter(|m| m.role == ChatRole::Assistant)
        .count();
    let system = session
        .log()
        .iter()
        .filter(|m| m.role == ChatRole::System)
        .count();
    assert_eq!(assistant, 0);
    assert_eq!(system, 1);
}
