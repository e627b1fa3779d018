//! Payment operations
//!
//! Recording a payment reads the current balance, allocates, inserts the
//! payment and writes the reduced balance in one write transaction, so
//! concurrent payments against the same debt apply one after another.

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, warn};

use super::debts::query_debt;
use super::{parse_date, parse_datetime, with_write_transaction, Database};
use crate::error::{Error, Result};
use crate::ledger::{allocate_payment_for, apply_payment, Ledger, MissingDebtPolicy};
use crate::models::{NewPayment, Payment};

const PAYMENT_COLUMNS: &str = "id, debt_id, amount, date, note, interest_amount, \
    capital_amount, idempotency_key, created_at";

fn row_to_payment(row: &Row) -> rusqlite::Result<Payment> {
    let date: String = row.get(3)?;
    let created_at: String = row.get(8)?;
    Ok(Payment {
        id: row.get(0)?,
        debt_id: row.get(1)?,
        amount: row.get(2)?,
        date: parse_date(3, &date)?,
        note: row.get(4)?,
        interest_amount: row.get(5)?,
        capital_amount: row.get(6)?,
        idempotency_key: row.get(7)?,
        created_at: parse_datetime(&created_at),
    })
}

fn query_payment(conn: &Connection, user_id: &str, id: i64) -> Result<Option<Payment>> {
    let payment = conn
        .query_row(
            &format!(
                "SELECT {} FROM payments WHERE user_id = ? AND id = ?",
                PAYMENT_COLUMNS
            ),
            params![user_id, id],
            row_to_payment,
        )
        .optional()?;
    Ok(payment)
}

fn query_payment_by_key(conn: &Connection, user_id: &str, key: &str) -> Result<Option<Payment>> {
    let payment = conn
        .query_row(
            &format!(
                "SELECT {} FROM payments WHERE user_id = ? AND idempotency_key = ?",
                PAYMENT_COLUMNS
            ),
            params![user_id, key],
            row_to_payment,
        )
        .optional()?;
    Ok(payment)
}

fn insert_payment(
    conn: &Connection,
    user_id: &str,
    new_payment: &NewPayment,
    policy: MissingDebtPolicy,
) -> Result<Payment> {
    if let Some(ref key) = new_payment.idempotency_key {
        if let Some(existing) = query_payment_by_key(conn, user_id, key)? {
            debug!(key = %key, payment_id = existing.id, "Replayed payment submission");
            return Ok(existing);
        }
    }

    let debt = query_debt(conn, user_id, new_payment.debt_id)?;
    if debt.is_none() {
        match policy {
            MissingDebtPolicy::Reject => return Err(Error::DebtNotFound(new_payment.debt_id)),
            MissingDebtPolicy::TreatAsPrincipal => warn!(
                debt_id = new_payment.debt_id,
                amount = new_payment.amount,
                "Payment references a missing debt, recording full amount as principal"
            ),
        }
    }

    let allocation = allocate_payment_for(debt.as_ref(), new_payment.amount);

    conn.execute(
        r#"
        INSERT INTO payments (user_id, debt_id, amount, date, note,
                              interest_amount, capital_amount, idempotency_key)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            user_id,
            new_payment.debt_id,
            new_payment.amount,
            new_payment.date.format("%Y-%m-%d").to_string(),
            new_payment.normalized_note(),
            allocation.interest_amount,
            allocation.capital_amount,
            new_payment.idempotency_key
        ],
    )?;
    let id = conn.last_insert_rowid();

    if let Some(ref debt) = debt {
        let updated = apply_payment(debt, allocation.capital_amount);
        if updated.is_overpaid() {
            warn!(
                debt_id = updated.id,
                balance = updated.amount,
                "Debt balance is negative after payment"
            );
        }
        conn.execute(
            "UPDATE debts SET amount = ? WHERE user_id = ? AND id = ?",
            params![updated.amount, user_id, updated.id],
        )?;
    }

    query_payment(conn, user_id, id)?.ok_or_else(|| Error::NotFound(format!("payment {}", id)))
}

impl Database {
    /// Record a payment: validate, allocate against the stored balance, insert
    /// and reduce the balance atomically.
    ///
    /// A payment whose idempotency key was already used by this user returns
    /// the original payment without applying anything.
    pub fn record_payment(
        &self,
        user_id: &str,
        new_payment: &NewPayment,
        policy: MissingDebtPolicy,
    ) -> Result<Payment> {
        new_payment.validate()?;
        let conn = self.conn()?;

        with_write_transaction(&conn, |conn| {
            insert_payment(conn, user_id, new_payment, policy)
        })
    }

    /// List a user's payments, most recent first
    pub fn list_payments(&self, user_id: &str) -> Result<Vec<Payment>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM payments WHERE user_id = ? ORDER BY date DESC, id DESC",
            PAYMENT_COLUMNS
        ))?;

        let payments = stmt
            .query_map(params![user_id], row_to_payment)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(payments)
    }

    /// List payments recorded against one debt, most recent first
    pub fn list_payments_for_debt(&self, user_id: &str, debt_id: i64) -> Result<Vec<Payment>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM payments WHERE user_id = ? AND debt_id = ? ORDER BY date DESC, id DESC",
            PAYMENT_COLUMNS
        ))?;

        let payments = stmt
            .query_map(params![user_id, debt_id], row_to_payment)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(payments)
    }

    /// Get a payment by ID
    pub fn get_payment(&self, user_id: &str, id: i64) -> Result<Option<Payment>> {
        let conn = self.conn()?;
        query_payment(&conn, user_id, id)
    }

    /// Snapshot a user's debts and payments as an in-memory ledger
    pub fn load_ledger(&self, user_id: &str) -> Result<Ledger> {
        let debts = self.list_debts(user_id)?;
        let payments = self.list_payments(user_id)?;
        Ok(Ledger::from_records(debts, payments))
    }
}
