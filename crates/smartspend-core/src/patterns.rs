//! Recurring pattern learner
//!
//! Finds categories a user spends on regularly and consistently: enough
//! records, amounts within a tight band, and a habitual time of day. Learned
//! patterns feed the suggestion generator.

use chrono::Timelike;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::PatternConfig;
use crate::db::Database;
use crate::error::Result;
use crate::insights::features::mean;
use crate::models::{ExpenseRecord, LearnedPattern};

/// Counts from one learn run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LearnSummary {
    /// New pattern rows
    pub created: usize,
    /// Existing rows overwritten
    pub updated: usize,
    /// Categories that did not qualify
    pub skipped: usize,
}

/// Mine stable per-category habits from a history
///
/// Categories are returned in order of first appearance. Nothing is learned
/// from a history with fewer than `config.min_occurrences` records.
pub fn mine_patterns(history: &[ExpenseRecord], config: &PatternConfig) -> Vec<LearnedPattern> {
    mine_with_skips(history, config).0
}

fn mine_with_skips(
    history: &[ExpenseRecord],
    config: &PatternConfig,
) -> (Vec<LearnedPattern>, usize) {
    if history.len() < config.min_occurrences {
        return (Vec::new(), 0);
    }

    let mut grouped: Vec<(&str, Vec<&ExpenseRecord>)> = Vec::new();
    for record in history {
        match grouped.iter_mut().find(|(c, _)| *c == record.category) {
            Some((_, items)) => items.push(record),
            None => grouped.push((&record.category, vec![record])),
        }
    }

    let mut skipped = 0;
    let mut patterns = Vec::new();
    for (category, items) in grouped {
        match learn_category(category, &items, config) {
            Some(pattern) => patterns.push(pattern),
            None => skipped += 1,
        }
    }
    (patterns, skipped)
}

fn learn_category(
    category: &str,
    items: &[&ExpenseRecord],
    config: &PatternConfig,
) -> Option<LearnedPattern> {
    if items.len() < config.min_occurrences {
        debug!(category, count = items.len(), "Too few records for a pattern");
        return None;
    }

    let amounts: Vec<f64> = items.iter().map(|r| r.amount).collect();
    let avg_amount = mean(&amounts);
    let min_amount = amounts.iter().copied().fold(f64::INFINITY, f64::min);
    let max_amount = amounts.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if max_amount - min_amount > avg_amount * config.max_spread_ratio {
        debug!(category, min_amount, max_amount, "Amounts too spread for a pattern");
        return None;
    }

    let hours = items.iter().map(|r| r.date.hour());
    let earliest = hours.clone().min()?;
    let latest = hours.max()?;

    Some(LearnedPattern {
        category: category.to_string(),
        avg_amount,
        min_amount,
        max_amount,
        preferred_hour_start: earliest.saturating_sub(1),
        preferred_hour_end: (latest + 1).min(23),
        confidence: (items.len() as f64 / config.confidence_saturation as f64).min(1.0),
        occurrences: items.len(),
    })
}

/// Learn patterns from a user's history and persist them
///
/// Existing rows for the same category are overwritten; all writes share one
/// transaction.
pub fn learn_patterns(
    db: &Database,
    user_id: i64,
    history: &[ExpenseRecord],
    config: &PatternConfig,
) -> Result<LearnSummary> {
    let (patterns, skipped) = mine_with_skips(history, config);
    let upsert = db.upsert_patterns(user_id, &patterns)?;

    let summary = LearnSummary {
        created: upsert.created,
        updated: upsert.updated,
        skipped,
    };
    info!(
        user_id,
        created = summary.created,
        updated = summary.updated,
        skipped = summary.skipped,
        "Pattern learning complete"
    );
    Ok(summary)
}
