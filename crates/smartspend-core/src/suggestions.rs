//! Suggestion generator
//!
//! Turns confident learned patterns into proposed expenses the user can
//! confirm or reject. At most one suggestion per category is pending at a
//! time, so running the generator repeatedly is safe.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::SuggestionConfig;
use crate::db::Database;
use crate::error::Result;
use crate::models::{ExpensePattern, ExpenseSuggestion, NewSuggestion, SUGGESTION_SOURCE_PATTERN};

/// Proposed expenses for patterns at or above the confidence floor
pub fn candidate_suggestions(
    patterns: &[ExpensePattern],
    config: &SuggestionConfig,
    now: DateTime<Utc>,
) -> Vec<NewSuggestion> {
    patterns
        .iter()
        .filter(|p| p.confidence >= config.min_confidence)
        .map(|p| NewSuggestion {
            category: p.category.clone(),
            suggested_amount: p.avg_amount.round_ties_even(),
            suggested_date: now,
            source: SUGGESTION_SOURCE_PATTERN.to_string(),
        })
        .collect()
}

/// Create pending suggestions for a user's confident patterns
///
/// Categories that already have a pending suggestion are skipped. Returns
/// the suggestions created by this call.
pub fn generate_suggestions(
    db: &Database,
    user_id: i64,
    patterns: &[ExpensePattern],
    config: &SuggestionConfig,
) -> Result<Vec<ExpenseSuggestion>> {
    let candidates = candidate_suggestions(patterns, config, Utc::now());
    let created = db.create_pending_suggestions(user_id, &candidates)?;

    info!(
        user_id,
        candidates = candidates.len(),
        created = created.len(),
        "Suggestion generation complete"
    );
    Ok(created)
}
