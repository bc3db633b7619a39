//! Expense command implementations (import, add, list)

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use smartspend_core::db::Database;
use smartspend_core::import::{import_expenses, parse_datetime};
use smartspend_core::models::NewExpense;

use super::{print_json, truncate};

pub fn cmd_import(db: &Database, user_id: i64, file: &Path, json: bool) -> Result<()> {
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;

    if !json {
        println!("📥 Importing expenses from {}...", file.display());
    }

    let imported = import_expenses(db, user_id, csv_file)
        .with_context(|| format!("Failed to import {}", file.display()))?;

    if json {
        return print_json(&serde_json::json!({ "user_id": user_id, "imported": imported }));
    }

    println!("✅ Imported {} expenses for user {}", imported, user_id);
    println!();
    println!("Next steps:");
    println!("  smartspend report   - see forecast, risks and anomalies");
    println!("  smartspend learn    - learn recurring expense patterns");

    Ok(())
}

pub fn cmd_add(
    db: &Database,
    user_id: i64,
    amount: f64,
    category: &str,
    date: Option<&str>,
    merchant: Option<&str>,
    json: bool,
) -> Result<()> {
    let date = match date {
        Some(s) => parse_datetime(s).map_err(|e| anyhow::anyhow!(e))?,
        None => chrono::Local::now().naive_local(),
    };

    let mut expense = NewExpense::new(date, amount, category);
    if let Some(merchant) = merchant {
        expense = expense.with_merchant(merchant);
    }

    let id = db
        .insert_expense(user_id, &expense)
        .context("Failed to record expense")?;

    if json {
        let stored = db
            .get_expense(id)?
            .ok_or_else(|| anyhow::anyhow!("Expense {} not found", id))?;
        return print_json(&stored);
    }

    println!(
        "✅ Recorded expense {}: {:.2} │ {} │ {}",
        id,
        amount,
        category.trim(),
        date.format("%Y-%m-%d %H:%M")
    );

    Ok(())
}

pub fn cmd_expenses_list(db: &Database, user_id: i64, limit: i64, json: bool) -> Result<()> {
    let expenses = db.list_expenses(user_id, Some(limit))?;

    if json {
        return print_json(&expenses);
    }

    if expenses.is_empty() {
        println!("No expenses found. Import some with:");
        println!("  smartspend import --file expenses.csv");
        return Ok(());
    }

    println!();
    println!("📝 Recent Expenses");
    println!("   ─────────────────────────────────────────────────────────────");

    for expense in expenses {
        let marker = if expense.is_auto { " (auto)" } else { "" };
        println!(
            "   [{}] {} │ {:>10.2} │ {:<15} │ {}{}",
            expense.id,
            expense.date.format("%Y-%m-%d %H:%M"),
            expense.amount,
            truncate(&expense.category, 15),
            truncate(expense.merchant.as_deref().unwrap_or("-"), 25),
            marker
        );
    }

    Ok(())
}
