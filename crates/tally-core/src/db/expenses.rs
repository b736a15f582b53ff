//! Expense operations
//!
//! Every query is scoped to an owner; one user can never read or modify
//! another user's expenses through these methods.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use rust_decimal::Decimal;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{amount_to_cents, cents_to_amount, Expense, ExpenseUpdate, NewExpense};

const EXPENSE_COLUMNS: &str = "id, owner, title, amount_cents, category, date, created_at";

impl Database {
    /// Insert an expense for an owner, returning the new ID
    pub fn insert_expense(&self, owner: &str, expense: &NewExpense) -> Result<i64> {
        let expense = expense.clone().validated()?;
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO expenses (owner, title, amount_cents, category, date) VALUES (?, ?, ?, ?, ?)",
            params![
                owner,
                expense.title,
                amount_to_cents(expense.amount)?,
                expense.category,
                expense.date.to_string(),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// List an owner's expenses, newest first
    pub fn list_expenses(&self, owner: &str, limit: i64, offset: i64) -> Result<Vec<Expense>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM expenses WHERE owner = ? ORDER BY date DESC, id DESC LIMIT ? OFFSET ?",
            EXPENSE_COLUMNS
        ))?;

        let expenses = stmt
            .query_map(params![owner, limit, offset], Self::row_to_expense)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(expenses)
    }

    /// Count an owner's expenses
    pub fn count_expenses(&self, owner: &str) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM expenses WHERE owner = ?",
            params![owner],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Get a single expense, only if it belongs to the owner
    pub fn get_expense(&self, owner: &str, id: i64) -> Result<Option<Expense>> {
        let conn = self.conn()?;
        let expense = conn
            .query_row(
                &format!(
                    "SELECT {} FROM expenses WHERE id = ? AND owner = ?",
                    EXPENSE_COLUMNS
                ),
                params![id, owner],
                Self::row_to_expense,
            )
            .optional()?;

        Ok(expense)
    }

    /// Replace an expense's fields. Returns false if the owner has no such expense.
    pub fn update_expense(&self, owner: &str, id: i64, update: &ExpenseUpdate) -> Result<bool> {
        let update = update.clone().validated()?;
        let conn = self.conn()?;

        let changed = conn.execute(
            "UPDATE expenses SET title = ?, amount_cents = ?, category = ?, date = ?
             WHERE id = ? AND owner = ?",
            params![
                update.title,
                amount_to_cents(update.amount)?,
                update.category,
                update.date.to_string(),
                id,
                owner,
            ],
        )?;

        Ok(changed > 0)
    }

    /// Delete an expense. Returns false if the owner has no such expense.
    pub fn delete_expense(&self, owner: &str, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM expenses WHERE id = ? AND owner = ?",
            params![id, owner],
        )?;
        Ok(changed > 0)
    }

    /// Sum of amounts dated within `[from, to]` (open-ended when `to` is None)
    pub fn sum_expense_amounts(
        &self,
        owner: &str,
        from: NaiveDate,
        to: Option<NaiveDate>,
    ) -> Result<Decimal> {
        let conn = self.conn()?;
        let cents: i64 = conn.query_row(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM expenses
             WHERE owner = ?1 AND date >= ?2 AND (?3 IS NULL OR date <= ?3)",
            params![owner, from.to_string(), to.map(|d| d.to_string())],
            |row| row.get(0),
        )?;

        Ok(cents_to_amount(cents))
    }

    /// Per-category totals within `[from, to]`, largest first
    ///
    /// Expenses without a category are grouped under `None`. Ties are ordered
    /// by category name so results are stable.
    pub fn category_totals(
        &self,
        owner: &str,
        from: NaiveDate,
        to: Option<NaiveDate>,
    ) -> Result<Vec<(Option<String>, Decimal)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT category, SUM(amount_cents) AS total
            FROM expenses
            WHERE owner = ?1 AND date >= ?2 AND (?3 IS NULL OR date <= ?3)
            GROUP BY category
            ORDER BY total DESC, category ASC
            "#,
        )?;

        let totals = stmt
            .query_map(
                params![owner, from.to_string(), to.map(|d| d.to_string())],
                |row| {
                    let category: Option<String> = row.get(0)?;
                    let cents: i64 = row.get(1)?;
                    Ok((category, cents_to_amount(cents)))
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(totals)
    }

    /// Helper to convert a row to Expense
    /// Column order: id, owner, title, amount_cents, category, date, created_at
    fn row_to_expense(row: &rusqlite::Row) -> rusqlite::Result<Expense> {
        let date_str: String = row.get(5)?;
        let created_at_str: String = row.get(6)?;
        Ok(Expense {
            id: row.get(0)?,
            owner: row.get(1)?,
            title: row.get(2)?,
            amount: cents_to_amount(row.get(3)?),
            category: row.get(4)?,
            date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").unwrap_or_default(),
            created_at: parse_datetime(&created_at_str),
        })
    }
}
