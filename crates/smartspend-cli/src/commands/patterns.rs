//! Pattern learning and suggestion command implementations

use anyhow::{Context, Result};
use smartspend_core::db::Database;
use smartspend_core::models::SuggestionStatus;
use smartspend_core::{generate_suggestions, learn_patterns, IntelligenceEngine};

use super::print_json;

pub fn cmd_learn(
    db: &Database,
    engine: &IntelligenceEngine,
    user_id: i64,
    json: bool,
) -> Result<()> {
    let history = db.list_expense_history(user_id)?;
    let summary = learn_patterns(db, user_id, &history, &engine.config().patterns)
        .context("Failed to learn expense patterns")?;

    if json {
        return print_json(&summary);
    }

    println!("🧠 Learned expense patterns for user {}", user_id);
    println!("   ─────────────────────────────");
    println!("   New patterns: {}", summary.created);
    println!("   Updated patterns: {}", summary.updated);
    println!("   Skipped categories: {}", summary.skipped);

    let currency = &engine.config().narrative.currency_symbol;
    let patterns = db.list_patterns(user_id)?;
    if !patterns.is_empty() {
        println!();
        for p in &patterns {
            println!(
                "   {:<15} ~{}{:.2} ({}{:.2}-{}{:.2}) │ {:02}:00-{:02}:59 │ {:.0}% confident",
                p.category,
                currency,
                p.avg_amount,
                currency,
                p.min_amount,
                currency,
                p.max_amount,
                p.preferred_hour_start,
                p.preferred_hour_end,
                p.confidence * 100.0
            );
        }
    }

    Ok(())
}

pub fn cmd_suggest(
    db: &Database,
    engine: &IntelligenceEngine,
    user_id: i64,
    json: bool,
) -> Result<()> {
    let patterns = db.list_patterns(user_id)?;
    let created = generate_suggestions(db, user_id, &patterns, &engine.config().suggestions)
        .context("Failed to generate suggestions")?;

    if json {
        return print_json(&created);
    }

    if patterns.is_empty() {
        println!("No learned patterns yet. Run 'smartspend learn' first.");
        return Ok(());
    }

    if created.is_empty() {
        println!("No new suggestions. Pending ones are listed with 'smartspend suggestions'.");
        return Ok(());
    }

    let currency = &engine.config().narrative.currency_symbol;
    println!("✨ Created {} suggestions:", created.len());
    for s in &created {
        println!("   [{}] {} {}{:.2}", s.id, s.category, currency, s.suggested_amount);
    }
    println!();
    println!("   Confirm with 'smartspend suggestions confirm <id>'");

    Ok(())
}

pub fn cmd_suggestions_list(db: &Database, user_id: i64, status: &str, json: bool) -> Result<()> {
    let filter = match status {
        "all" => None,
        s => Some(
            s.parse::<SuggestionStatus>()
                .map_err(|e| anyhow::anyhow!(e))?,
        ),
    };
    let suggestions = db.list_suggestions(user_id, filter)?;

    if json {
        return print_json(&suggestions);
    }

    if suggestions.is_empty() {
        println!("No {} suggestions.", status);
        return Ok(());
    }

    println!();
    println!("📋 Suggestions ({})", status);
    println!("   ─────────────────────────────────────────────────────────────");

    for s in suggestions {
        println!(
            "   [{}] {:<15} │ {:>10.2} │ {} │ {}",
            s.id,
            s.category,
            s.suggested_amount,
            s.suggested_date.format("%Y-%m-%d"),
            s.status
        );
    }

    Ok(())
}

pub fn cmd_suggestions_confirm(db: &Database, user_id: i64, id: i64, json: bool) -> Result<()> {
    let expense = db
        .confirm_suggestion(user_id, id)
        .with_context(|| format!("Failed to confirm suggestion {}", id))?;

    if json {
        return print_json(&expense);
    }

    println!(
        "✅ Confirmed suggestion {}: recorded {:.2} for {} (expense {})",
        id, expense.amount, expense.category, expense.id
    );
    Ok(())
}

pub fn cmd_suggestions_reject(db: &Database, user_id: i64, id: i64) -> Result<()> {
    db.reject_suggestion(user_id, id)
        .with_context(|| format!("Failed to reject suggestion {}", id))?;

    println!("🗑️  Rejected suggestion {}", id);
    Ok(())
}
