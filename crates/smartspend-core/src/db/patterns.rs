//! Learned pattern operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{ExpensePattern, LearnedPattern, PATTERN_FREQUENCY_DAILY};

const PATTERN_COLUMNS: &str = "id, user_id, category, avg_amount, min_amount, max_amount, \
     preferred_hour_start, preferred_hour_end, frequency, confidence, updated_at";

/// Outcome of writing one learn run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternUpsert {
    pub created: usize,
    pub updated: usize,
}

impl Database {
    /// Write learned patterns, overwriting existing rows for the same category
    ///
    /// All rows are written in a single transaction.
    pub fn upsert_patterns(
        &self,
        user_id: i64,
        patterns: &[LearnedPattern],
    ) -> Result<PatternUpsert> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut outcome = PatternUpsert::default();

        for pattern in patterns {
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM expense_patterns WHERE user_id = ? AND category = ?",
                    params![user_id, pattern.category],
                    |row| row.get(0),
                )
                .optional()?;

            match existing {
                Some(id) => {
                    tx.execute(
                        r#"
                        UPDATE expense_patterns SET
                            avg_amount = ?,
                            min_amount = ?,
                            max_amount = ?,
                            preferred_hour_start = ?,
                            preferred_hour_end = ?,
                            confidence = ?,
                            updated_at = CURRENT_TIMESTAMP
                        WHERE id = ?
                        "#,
                        params![
                            pattern.avg_amount,
                            pattern.min_amount,
                            pattern.max_amount,
                            pattern.preferred_hour_start,
                            pattern.preferred_hour_end,
                            pattern.confidence,
                            id,
                        ],
                    )?;
                    outcome.updated += 1;
                }
                None => {
                    tx.execute(
                        r#"
                        INSERT INTO expense_patterns (
                            user_id, category, avg_amount, min_amount, max_amount,
                            preferred_hour_start, preferred_hour_end, frequency, confidence
                        )
                        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                        "#,
                        params![
                            user_id,
                            pattern.category,
                            pattern.avg_amount,
                            pattern.min_amount,
                            pattern.max_amount,
                            pattern.preferred_hour_start,
                            pattern.preferred_hour_end,
                            PATTERN_FREQUENCY_DAILY,
                            pattern.confidence,
                        ],
                    )?;
                    outcome.created += 1;
                }
            }
        }

        tx.commit()?;
        Ok(outcome)
    }

    /// All learned patterns for a user, by category
    pub fn list_patterns(&self, user_id: i64) -> Result<Vec<ExpensePattern>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM expense_patterns WHERE user_id = ? ORDER BY category",
            PATTERN_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let patterns = stmt
            .query_map(params![user_id], |row| Self::row_to_pattern(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(patterns)
    }

    /// The learned pattern for one category, if any
    pub fn get_pattern(&self, user_id: i64, category: &str) -> Result<Option<ExpensePattern>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM expense_patterns WHERE user_id = ? AND category = ?",
            PATTERN_COLUMNS
        );
        let pattern = conn
            .query_row(&sql, params![user_id, category], |row| {
                Self::row_to_pattern(row)
            })
            .optional()?;
        Ok(pattern)
    }

    fn row_to_pattern(row: &rusqlite::Row) -> rusqlite::Result<ExpensePattern> {
        let updated_at_str: String = row.get(10)?;
        Ok(ExpensePattern {
            id: row.get(0)?,
            user_id: row.get(1)?,
            category: row.get(2)?,
            avg_amount: row.get(3)?,
            min_amount: row.get(4)?,
            max_amount: row.get(5)?,
            preferred_hour_start: row.get(6)?,
            preferred_hour_end: row.get(7)?,
            frequency: row.get(8)?,
            confidence: row.get(9)?,
            updated_at: parse_datetime(&updated_at_str),
        })
    }
}
