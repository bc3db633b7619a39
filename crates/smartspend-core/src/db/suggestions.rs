//! Expense suggestion operations

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::{format_datetime, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Expense, ExpenseSuggestion, NewSuggestion, SuggestionStatus};

const SUGGESTION_COLUMNS: &str =
    "id, user_id, category, suggested_amount, suggested_date, status, source, created_at";

impl Database {
    /// Insert suggestions for categories without a pending one
    ///
    /// The pending check and the insert for every category happen in one
    /// transaction. Returns only the suggestions that were created.
    pub fn create_pending_suggestions(
        &self,
        user_id: i64,
        suggestions: &[NewSuggestion],
    ) -> Result<Vec<ExpenseSuggestion>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut created = Vec::new();

        for suggestion in suggestions {
            let pending: Option<i64> = tx
                .query_row(
                    "SELECT id FROM expense_suggestions
                     WHERE user_id = ? AND category = ? AND status = 'pending'
                     LIMIT 1",
                    params![user_id, suggestion.category],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(existing) = pending {
                debug!(
                    category = suggestion.category.as_str(),
                    existing, "Pending suggestion exists, skipping"
                );
                continue;
            }

            tx.execute(
                r#"
                INSERT INTO expense_suggestions (user_id, category, suggested_amount, suggested_date, status, source)
                VALUES (?, ?, ?, ?, 'pending', ?)
                "#,
                params![
                    user_id,
                    suggestion.category,
                    suggestion.suggested_amount,
                    format_datetime(&suggestion.suggested_date.naive_utc()),
                    suggestion.source,
                ],
            )?;
            let id = tx.last_insert_rowid();
            if let Some(row) = Self::suggestion_in(&tx, user_id, id)? {
                created.push(row);
            }
        }

        tx.commit()?;
        Ok(created)
    }

    /// A user's suggestions, newest first, optionally filtered by status
    pub fn list_suggestions(
        &self,
        user_id: i64,
        status: Option<SuggestionStatus>,
    ) -> Result<Vec<ExpenseSuggestion>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM expense_suggestions
             WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2)
             ORDER BY created_at DESC, id DESC",
            SUGGESTION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let suggestions = stmt
            .query_map(params![user_id, status.map(|s| s.as_str())], |row| {
                Self::row_to_suggestion(row)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(suggestions)
    }

    /// Get one of a user's suggestions by ID
    pub fn get_suggestion(&self, user_id: i64, id: i64) -> Result<Option<ExpenseSuggestion>> {
        let conn = self.conn()?;
        Self::suggestion_in(&conn, user_id, id)
    }

    /// Accept a pending suggestion and record it as an automatic expense
    ///
    /// The status change and the expense insert commit together.
    pub fn confirm_suggestion(&self, user_id: i64, id: i64) -> Result<Expense> {
        let expense_id = {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            let suggestion = Self::pending_suggestion(&tx, user_id, id)?;

            tx.execute(
                "UPDATE expense_suggestions SET status = 'confirmed' WHERE id = ?",
                params![id],
            )?;
            tx.execute(
                r#"
                INSERT INTO expenses (user_id, date, amount, category, merchant, is_auto)
                VALUES (?, ?, ?, ?, NULL, 1)
                "#,
                params![
                    user_id,
                    format_datetime(&Utc::now().naive_utc()),
                    suggestion.suggested_amount,
                    suggestion.category,
                ],
            )?;
            let expense_id = tx.last_insert_rowid();
            tx.commit()?;
            expense_id
        };

        debug!(suggestion_id = id, expense_id, "Suggestion confirmed");
        self.get_expense(expense_id)?
            .ok_or_else(|| Error::NotFound(format!("Expense {} after confirmation", expense_id)))
    }

    /// Decline a pending suggestion
    pub fn reject_suggestion(&self, user_id: i64, id: i64) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        Self::pending_suggestion(&tx, user_id, id)?;
        tx.execute(
            "UPDATE expense_suggestions SET status = 'rejected' WHERE id = ?",
            params![id],
        )?;
        tx.commit()?;

        debug!(suggestion_id = id, "Suggestion rejected");
        Ok(())
    }

    /// Load a suggestion that must exist, belong to the user, and be pending
    fn pending_suggestion(conn: &Connection, user_id: i64, id: i64) -> Result<ExpenseSuggestion> {
        let suggestion = Self::suggestion_in(conn, user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Suggestion {}", id)))?;
        if suggestion.status != SuggestionStatus::Pending {
            return Err(Error::InvalidData(format!(
                "Suggestion {} is already {}",
                id, suggestion.status
            )));
        }
        Ok(suggestion)
    }

    fn suggestion_in(conn: &Connection, user_id: i64, id: i64) -> Result<Option<ExpenseSuggestion>> {
        let sql = format!(
            "SELECT {} FROM expense_suggestions WHERE id = ? AND user_id = ?",
            SUGGESTION_COLUMNS
        );
        let suggestion = conn
            .query_row(&sql, params![id, user_id], |row| {
                Self::row_to_suggestion(row)
            })
            .optional()?;
        Ok(suggestion)
    }

    /// Column order: id, user_id, category, suggested_amount, suggested_date, status, source, created_at
    fn row_to_suggestion(row: &rusqlite::Row) -> rusqlite::Result<ExpenseSuggestion> {
        let suggested_date_str: String = row.get(4)?;
        let status_str: String = row.get(5)?;
        let created_at_str: String = row.get(7)?;
        let status = status_str.parse::<SuggestionStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, e.into())
        })?;
        Ok(ExpenseSuggestion {
            id: row.get(0)?,
            user_id: row.get(1)?,
            category: row.get(2)?,
            suggested_amount: row.get(3)?,
            suggested_date: parse_datetime(&suggested_date_str),
            status,
            source: row.get(6)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
