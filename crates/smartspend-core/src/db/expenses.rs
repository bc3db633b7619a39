//! Expense operations

use rusqlite::{params, OptionalExtension};

use super::{format_datetime, parse_datetime, parse_expense_date, Database};
use crate::error::Result;
use crate::models::{Expense, ExpenseRecord, NewExpense};

const EXPENSE_COLUMNS: &str =
    "id, user_id, date, amount, category, merchant, is_auto, created_at";

impl Database {
    /// Insert a validated expense, returning its ID
    pub fn insert_expense(&self, user_id: i64, expense: &NewExpense) -> Result<i64> {
        expense.validate()?;
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO expenses (user_id, date, amount, category, merchant, is_auto)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                format_datetime(&expense.date),
                expense.amount,
                expense.category.trim(),
                expense.merchant,
                expense.is_auto,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Insert many expenses in one transaction
    ///
    /// Every expense is validated first; nothing is written if any is invalid.
    pub fn insert_expenses(&self, user_id: i64, expenses: &[NewExpense]) -> Result<usize> {
        for expense in expenses {
            expense.validate()?;
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO expenses (user_id, date, amount, category, merchant, is_auto)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )?;
            for expense in expenses {
                stmt.execute(params![
                    user_id,
                    format_datetime(&expense.date),
                    expense.amount,
                    expense.category.trim(),
                    expense.merchant,
                    expense.is_auto,
                ])?;
            }
        }
        tx.commit()?;

        Ok(expenses.len())
    }

    /// A user's full expense history, oldest first (the engine's input)
    pub fn list_expense_history(&self, user_id: i64) -> Result<Vec<ExpenseRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT date, amount, category FROM expenses
             WHERE user_id = ? ORDER BY date ASC, id ASC",
        )?;

        let records = stmt
            .query_map(params![user_id], |row| {
                let date: String = row.get(0)?;
                Ok(ExpenseRecord {
                    date: parse_expense_date(0, &date)?,
                    amount: row.get(1)?,
                    category: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Most recent expenses first
    pub fn list_expenses(&self, user_id: i64, limit: Option<i64>) -> Result<Vec<Expense>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM expenses WHERE user_id = ? ORDER BY date DESC, id DESC LIMIT ?",
            EXPENSE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        // LIMIT -1 means no limit in SQLite
        let expenses = stmt
            .query_map(params![user_id, limit.unwrap_or(-1)], |row| {
                Self::row_to_expense(row)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(expenses)
    }

    /// Get a single expense by ID
    pub fn get_expense(&self, id: i64) -> Result<Option<Expense>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM expenses WHERE id = ?", EXPENSE_COLUMNS);
        let expense = conn
            .query_row(&sql, params![id], |row| Self::row_to_expense(row))
            .optional()?;
        Ok(expense)
    }

    /// Count a user's expenses
    pub fn count_expenses(&self, user_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM expenses WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Helper to convert a row to Expense
    /// Column order: id, user_id, date, amount, category, merchant, is_auto, created_at
    pub(crate) fn row_to_expense(row: &rusqlite::Row) -> rusqlite::Result<Expense> {
        let date_str: String = row.get(2)?;
        let is_auto: i64 = row.get(6)?;
        let created_at_str: String = row.get(7)?;
        Ok(Expense {
            id: row.get(0)?,
            user_id: row.get(1)?,
            date: parse_expense_date(2, &date_str)?,
            amount: row.get(3)?,
            category: row.get(4)?,
            merchant: row.get(5)?,
            is_auto: is_auto != 0,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
