//! Ledger model
//!
//! Splits payments into interest and principal and keeps debt balances
//! consistent with the payments recorded against them:
//!
//! `original principal - sum(capital_amount) == current amount`
//!
//! The free functions are pure. [`Ledger`] is the explicit per-user store
//! that ties them together for callers that keep state in memory (the CLI
//! session, tests); the database applies the same functions inside a
//! SQL transaction.

mod history;

pub use history::{monthly_payment_history, MAX_HISTORY_MONTHS};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::advisor::FinancialContext;
use crate::error::{Error, Result};
use crate::models::{
    Aggregates, Debt, MonthlyTotal, NewDebt, NewPayment, Payment, PaymentAllocation,
};

/// What to do with a payment whose debt does not exist (deleted or never
/// created)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDebtPolicy {
    /// Record the payment with the whole amount as principal and reduce
    /// nothing
    #[default]
    TreatAsPrincipal,
    /// Refuse the payment with [`Error::DebtNotFound`]
    Reject,
}

impl MissingDebtPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TreatAsPrincipal => "treat_as_principal",
            Self::Reject => "reject",
        }
    }
}

impl std::str::FromStr for MissingDebtPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "treat_as_principal" | "principal" => Ok(Self::TreatAsPrincipal),
            "reject" => Ok(Self::Reject),
            _ => Err(format!("Unknown missing debt policy: {}", s)),
        }
    }
}

impl std::fmt::Display for MissingDebtPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Split a payment into the month's interest and the principal remainder.
///
/// A payment that does not cover the interest due is all interest.
pub fn allocate_payment(debt: &Debt, payment_amount: f64) -> PaymentAllocation {
    let interest_due = debt.interest_due();

    if payment_amount <= interest_due {
        PaymentAllocation {
            interest_amount: payment_amount,
            capital_amount: 0.0,
        }
    } else {
        PaymentAllocation {
            interest_amount: interest_due,
            capital_amount: payment_amount - interest_due,
        }
    }
}

/// Allocate against a debt that may not exist. Without a debt there is no
/// interest to charge, so the full amount counts as principal.
pub fn allocate_payment_for(debt: Option<&Debt>, payment_amount: f64) -> PaymentAllocation {
    match debt {
        Some(debt) => allocate_payment(debt, payment_amount),
        None => PaymentAllocation {
            interest_amount: 0.0,
            capital_amount: payment_amount,
        },
    }
}

/// Reduce a debt's balance by a principal amount. Not clamped at zero.
pub fn apply_payment(debt: &Debt, capital_amount: f64) -> Debt {
    Debt {
        amount: debt.amount - capital_amount,
        ..debt.clone()
    }
}

/// Totals for the dashboard and the advisor context
pub fn compute_aggregates(debts: &[Debt], payments: &[Payment]) -> Aggregates {
    Aggregates {
        total_debt: ordered_sum(debts.iter().map(|d| d.amount)),
        total_paid: ordered_sum(payments.iter().map(|p| p.amount)),
        total_monthly_payments: ordered_sum(debts.iter().map(|d| d.monthly_payment)),
    }
}

/// Summed in sorted order so the result does not depend on input order.
/// Starts from +0.0; `Sum for f64` starts from -0.0, which renders as "$-0.00".
fn ordered_sum(values: impl Iterator<Item = f64>) -> f64 {
    let mut values: Vec<f64> = values.collect();
    values.sort_by(f64::total_cmp);
    values.into_iter().fold(0.0, |acc, v| acc + v)
}

/// One user's debts and payments held in memory
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    debts: Vec<Debt>,
    payments: Vec<Payment>,
    policy: MissingDebtPolicy,
    next_debt_id: i64,
    next_payment_id: i64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::with_policy(MissingDebtPolicy::default())
    }

    pub fn with_policy(policy: MissingDebtPolicy) -> Self {
        Self {
            debts: Vec::new(),
            payments: Vec::new(),
            policy,
            next_debt_id: 1,
            next_payment_id: 1,
        }
    }

    /// Build a ledger from records loaded from storage
    pub fn from_records(debts: Vec<Debt>, payments: Vec<Payment>) -> Self {
        let next_debt_id = debts.iter().map(|d| d.id).max().unwrap_or(0) + 1;
        let next_payment_id = payments.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        Self {
            debts,
            payments,
            policy: MissingDebtPolicy::default(),
            next_debt_id,
            next_payment_id,
        }
    }

    pub fn set_policy(&mut self, policy: MissingDebtPolicy) {
        self.policy = policy;
    }

    pub fn policy(&self) -> MissingDebtPolicy {
        self.policy
    }

    pub fn debts(&self) -> &[Debt] {
        &self.debts
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn debt(&self, id: i64) -> Option<&Debt> {
        self.debts.iter().find(|d| d.id == id)
    }

    pub fn payments_for(&self, debt_id: i64) -> Vec<&Payment> {
        self.payments
            .iter()
            .filter(|p| p.debt_id == debt_id)
            .collect()
    }

    pub fn add_debt(&mut self, new_debt: NewDebt) -> Result<Debt> {
        new_debt.validate()?;

        let debt = Debt {
            id: self.next_debt_id,
            name: new_debt.name.trim().to_string(),
            amount: new_debt.amount,
            monthly_payment: new_debt.monthly_payment,
            interest_rate: new_debt.interest_rate,
            created_at: Utc::now(),
        };
        self.next_debt_id += 1;
        self.debts.push(debt.clone());

        Ok(debt)
    }

    /// Validate, allocate, reduce the target balance and record the payment.
    ///
    /// Nothing changes if any step fails. A payment whose idempotency key was
    /// already used returns the earlier payment unchanged.
    pub fn record_payment(&mut self, new_payment: NewPayment) -> Result<Payment> {
        new_payment.validate()?;

        if let Some(ref key) = new_payment.idempotency_key {
            if let Some(existing) = self
                .payments
                .iter()
                .find(|p| p.idempotency_key.as_deref() == Some(key.as_str()))
            {
                debug!(key = %key, payment_id = existing.id, "Replayed payment submission");
                return Ok(existing.clone());
            }
        }

        let index = self.debts.iter().position(|d| d.id == new_payment.debt_id);
        if index.is_none() {
            match self.policy {
                MissingDebtPolicy::Reject => {
                    return Err(Error::DebtNotFound(new_payment.debt_id));
                }
                MissingDebtPolicy::TreatAsPrincipal => {
                    warn!(
                        debt_id = new_payment.debt_id,
                        amount = new_payment.amount,
                        "Payment references a missing debt, recording full amount as principal"
                    );
                }
            }
        }

        let allocation =
            allocate_payment_for(index.map(|i| &self.debts[i]), new_payment.amount);

        if let Some(i) = index {
            let updated = apply_payment(&self.debts[i], allocation.capital_amount);
            if updated.is_overpaid() {
                warn!(
                    debt_id = updated.id,
                    balance = updated.amount,
                    "Debt balance is negative after payment"
                );
            }
            self.debts[i] = updated;
        }

        let payment = Payment {
            id: self.next_payment_id,
            debt_id: new_payment.debt_id,
            amount: new_payment.amount,
            date: new_payment.date,
            note: new_payment.normalized_note(),
            interest_amount: allocation.interest_amount,
            capital_amount: allocation.capital_amount,
            idempotency_key: new_payment.idempotency_key,
            created_at: Utc::now(),
        };
        self.next_payment_id += 1;
        self.payments.push(payment.clone());

        Ok(payment)
    }

    pub fn aggregates(&self) -> Aggregates {
        compute_aggregates(&self.debts, &self.payments)
    }

    pub fn financial_context(&self) -> FinancialContext {
        FinancialContext::new(&self.aggregates(), &self.debts, &self.payments)
    }

    pub fn payment_history(&self, today: NaiveDate, months: u32) -> Vec<MonthlyTotal> {
        monthly_payment_history(&self.payments, today, months)
    }
}

impl From<&Ledger> for FinancialContext {
    fn from(ledger: &Ledger) -> Self {
        ledger.financial_context()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    fn debt(id: i64, amount: f64, rate: f64) -> Debt {
        Debt {
            id,
            name: format!("Debt {}", id),
            amount,
            monthly_payment: 100.0,
            interest_rate: rate,
            created_at: Utc::now(),
        }
    }

    fn payment(id: i64, debt_id: i64, amount: f64) -> Payment {
        Payment {
            id,
            debt_id,
            amount,
            date: NaiveDate::from_ymd_opt(2024, 1, id as u32 % 28 + 1).unwrap(),
            note: None,
            interest_amount: 0.0,
            capital_amount: amount,
            idempotency_key: None,
            created_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_payment_equal_to_interest_is_all_interest() {
        let d = debt(1, 1000.0, 12.0);
        let a = allocate_payment(&d, 10.0);
        assert_eq!(a.interest_amount, 10.0);
        assert_eq!(a.capital_amount, 0.0);
    }

    #[test]
    fn test_payment_above_interest_splits() {
        let d = debt(1, 1000.0, 12.0);
        let a = allocate_payment(&d, 100.0);
        assert!(approx(a.interest_amount, 10.0));
        assert!(approx(a.capital_amount, 90.0));
        assert!(approx(apply_payment(&d, a.capital_amount).amount, 910.0));
    }

    #[test]
    fn test_payment_below_interest_leaves_balance() {
        let d = debt(1, 1000.0, 12.0);
        let a = allocate_payment(&d, 5.0);
        assert_eq!(a.interest_amount, 5.0);
        assert_eq!(a.capital_amount, 0.0);
        assert_eq!(apply_payment(&d, a.capital_amount).amount, 1000.0);
    }

    #[test]
    fn test_allocation_sums_to_payment() {
        let cases = [
            (2500.0, 19.99, 37.5),
            (12_000.0, 6.25, 410.0),
            (80.0, 0.0, 80.0),
            (310.55, 29.9, 3.1),
            (1.0, 100.0, 0.5),
        ];
        for (amount, rate, pay) in cases {
            let d = debt(1, amount, rate);
            let a = allocate_payment(&d, pay);
            assert!(approx(a.total(), pay), "case {:?}", (amount, rate, pay));
            assert!(a.interest_amount >= 0.0);
            assert!(a.capital_amount >= 0.0);
            if pay <= d.interest_due() {
                assert_eq!(a.capital_amount, 0.0);
                assert_eq!(a.interest_amount, pay);
            } else {
                assert_eq!(a.interest_amount, d.interest_due());
                assert_eq!(a.capital_amount, pay - d.interest_due());
            }
        }
    }

    #[test]
    fn test_zero_interest_is_all_principal() {
        let d = debt(1, 500.0, 0.0);
        let a = allocate_payment(&d, 50.0);
        assert_eq!(a.interest_amount, 0.0);
        assert_eq!(a.capital_amount, 50.0);
    }

    #[test]
    fn test_missing_debt_allocation() {
        let a = allocate_payment_for(None, 42.0);
        assert_eq!(a.interest_amount, 0.0);
        assert_eq!(a.capital_amount, 42.0);
    }

    #[test]
    fn test_apply_payment_does_not_clamp() {
        let d = debt(1, 50.0, 0.0);
        let updated = apply_payment(&d, 80.0);
        assert_eq!(updated.amount, -30.0);
        assert!(updated.is_overpaid());
        assert_eq!(updated.name, d.name);
        assert_eq!(updated.id, d.id);
    }

    #[test]
    fn test_aggregates_empty() {
        let totals = compute_aggregates(&[], &[]);
        assert_eq!(totals, Aggregates::default());
        assert!(totals.total_debt.is_sign_positive());
        assert!(totals.total_paid.is_sign_positive());
        assert!(totals.total_monthly_payments.is_sign_positive());
    }

    #[test]
    fn test_aggregates_idempotent_and_order_independent() {
        let debts = vec![debt(1, 1000.1, 12.0), debt(2, 0.2, 3.0), debt(3, 333.3, 0.0)];
        let payments = vec![payment(1, 1, 0.1), payment(2, 2, 0.7), payment(3, 1, 19.99)];

        let first = compute_aggregates(&debts, &payments);
        assert_eq!(first, compute_aggregates(&debts, &payments));

        let mut debts_rev = debts.clone();
        debts_rev.reverse();
        let mut payments_rot = payments.clone();
        payments_rot.rotate_left(1);
        assert_eq!(first, compute_aggregates(&debts_rev, &payments_rot));

        assert!(approx(first.total_monthly_payments, 300.0));
    }

    #[test]
    fn test_total_debt_drops_by_capital() {
        let debts = vec![debt(1, 1000.0, 12.0), debt(2, 250.0, 5.0)];
        let before = compute_aggregates(&debts, &[]).total_debt;

        let a = allocate_payment(&debts[0], 100.0);
        let after_debts = vec![apply_payment(&debts[0], a.capital_amount), debts[1].clone()];
        let after = compute_aggregates(&after_debts, &[]).total_debt;

        assert!(approx(before - after, a.capital_amount));
    }

    fn card() -> NewDebt {
        NewDebt {
            name: "Visa".into(),
            amount: 1000.0,
            monthly_payment: 100.0,
            interest_rate: 12.0,
        }
    }

    #[test]
    fn test_ledger_record_payment_updates_balance() {
        let mut ledger = Ledger::new();
        let debt = ledger.add_debt(card()).unwrap();

        let p = ledger
            .record_payment(NewPayment::new(debt.id, 100.0, date(2024, 2, 1)).with_note("Feb"))
            .unwrap();

        assert!(approx(p.interest_amount, 10.0));
        assert!(approx(p.capital_amount, 90.0));
        assert_eq!(p.note.as_deref(), Some("Feb"));
        assert!(approx(ledger.debt(debt.id).unwrap().amount, 910.0));
        assert_eq!(ledger.payments_for(debt.id).len(), 1);
    }

    #[test]
    fn test_ledger_balance_matches_capital_sum() {
        let mut ledger = Ledger::new();
        let debt = ledger.add_debt(card()).unwrap();

        for (i, amount) in [100.0, 5.0, 250.0, 60.0].into_iter().enumerate() {
            ledger
                .record_payment(NewPayment::new(debt.id, amount, date(2024, 1 + i as u32, 1)))
                .unwrap();
        }

        let capital: f64 = ledger.payments().iter().map(|p| p.capital_amount).sum();
        assert!(approx(1000.0 - capital, ledger.debt(debt.id).unwrap().amount));
        for p in ledger.payments() {
            assert!(approx(p.interest_amount + p.capital_amount, p.amount));
        }
    }

    #[test]
    fn test_ledger_rejects_invalid_payment_without_change() {
        let mut ledger = Ledger::new();
        let debt = ledger.add_debt(card()).unwrap();

        let err = ledger
            .record_payment(NewPayment::new(debt.id, -4.0, date(2024, 1, 1)))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(ledger.payments().is_empty());
        assert_eq!(ledger.debt(debt.id).unwrap().amount, 1000.0);
    }

    #[test]
    fn test_ledger_missing_debt_treated_as_principal() {
        let mut ledger = Ledger::new();
        let debt = ledger.add_debt(card()).unwrap();

        let p = ledger
            .record_payment(NewPayment::new(99, 40.0, date(2024, 1, 1)))
            .unwrap();

        assert_eq!(p.interest_amount, 0.0);
        assert_eq!(p.capital_amount, 40.0);
        assert_eq!(ledger.debt(debt.id).unwrap().amount, 1000.0);
        assert_eq!(ledger.aggregates().total_paid, 40.0);
    }

    #[test]
    fn test_ledger_missing_debt_rejected() {
        let mut ledger = Ledger::with_policy(MissingDebtPolicy::Reject);
        let err = ledger
            .record_payment(NewPayment::new(7, 40.0, date(2024, 1, 1)))
            .unwrap_err();
        assert!(matches!(err, Error::DebtNotFound(7)));
        assert!(ledger.payments().is_empty());
    }

    #[test]
    fn test_ledger_idempotent_replay() {
        let mut ledger = Ledger::new();
        let debt = ledger.add_debt(card()).unwrap();
        let submit = NewPayment::new(debt.id, 100.0, date(2024, 2, 1)).with_idempotency_key("tok-1");

        let first = ledger.record_payment(submit.clone()).unwrap();
        let second = ledger.record_payment(submit).unwrap();

        assert_eq!(first, second);
        assert_eq!(ledger.payments().len(), 1);
        assert!(approx(ledger.debt(debt.id).unwrap().amount, 910.0));
    }

    #[test]
    fn test_ledger_from_records_continues_ids() {
        let ledger = Ledger::from_records(vec![debt(4, 10.0, 0.0)], vec![payment(9, 4, 1.0)]);
        let mut ledger = ledger;
        let d = ledger.add_debt(card()).unwrap();
        assert_eq!(d.id, 5);
        let p = ledger
            .record_payment(NewPayment::new(d.id, 1.0, date(2024, 1, 1)))
            .unwrap();
        assert_eq!(p.id, 10);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(
            "reject".parse::<MissingDebtPolicy>().unwrap(),
            MissingDebtPolicy::Reject
        );
        assert_eq!(
            "treat_as_principal".parse::<MissingDebtPolicy>().unwrap(),
            MissingDebtPolicy::TreatAsPrincipal
        );
        assert!("ignore".parse::<MissingDebtPolicy>().is_err());
    }
}
