//! Debt operations

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Debt, DebtUpdate, NewDebt};

const DEBT_COLUMNS: &str = "id, name, amount, monthly_payment, interest_rate, created_at";

fn row_to_debt(row: &Row) -> rusqlite::Result<Debt> {
    let created_at: String = row.get(5)?;
    Ok(Debt {
        id: row.get(0)?,
        name: row.get(1)?,
        amount: row.get(2)?,
        monthly_payment: row.get(3)?,
        interest_rate: row.get(4)?,
        created_at: parse_datetime(&created_at),
    })
}

/// Load a debt on an existing connection (used inside payment transactions)
pub(super) fn query_debt(conn: &Connection, user_id: &str, id: i64) -> Result<Option<Debt>> {
    let debt = conn
        .query_row(
            &format!(
                "SELECT {} FROM debts WHERE user_id = ? AND id = ?",
                DEBT_COLUMNS
            ),
            params![user_id, id],
            row_to_debt,
        )
        .optional()?;
    Ok(debt)
}

impl Database {
    /// Create a debt for a user
    pub fn create_debt(&self, user_id: &str, new_debt: &NewDebt) -> Result<Debt> {
        new_debt.validate()?;
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO debts (user_id, name, amount, monthly_payment, interest_rate)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                new_debt.name.trim(),
                new_debt.amount,
                new_debt.monthly_payment,
                new_debt.interest_rate
            ],
        )?;
        let id = conn.last_insert_rowid();

        query_debt(&conn, user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("debt {}", id)))
    }

    /// List a user's debts, oldest first
    pub fn list_debts(&self, user_id: &str) -> Result<Vec<Debt>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM debts WHERE user_id = ? ORDER BY created_at, id",
            DEBT_COLUMNS
        ))?;

        let debts = stmt
            .query_map(params![user_id], row_to_debt)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(debts)
    }

    /// Get a debt by ID
    pub fn get_debt(&self, user_id: &str, id: i64) -> Result<Option<Debt>> {
        let conn = self.conn()?;
        query_debt(&conn, user_id, id)
    }

    /// Update a debt's descriptive fields. Returns None if the debt does not exist.
    pub fn update_debt(&self, user_id: &str, id: i64, update: &DebtUpdate) -> Result<Option<Debt>> {
        update.validate()?;
        let conn = self.conn()?;

        let changed = conn.execute(
            r#"
            UPDATE debts SET
                name = COALESCE(?, name),
                monthly_payment = COALESCE(?, monthly_payment),
                interest_rate = COALESCE(?, interest_rate)
            WHERE user_id = ? AND id = ?
            "#,
            params![
                update.name.as_deref().map(str::trim),
                update.monthly_payment,
                update.interest_rate,
                user_id,
                id
            ],
        )?;

        if changed == 0 {
            return Ok(None);
        }
        query_debt(&conn, user_id, id)
    }

    /// Delete a debt. Its payments are kept. Returns false if it did not exist.
    pub fn delete_debt(&self, user_id: &str, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM debts WHERE user_id = ? AND id = ?",
            params![user_id, id],
        )?;
        Ok(deleted > 0)
    }
}
