//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;

use smartspend_core::db::Database;
use smartspend_core::models::SuggestionStatus;
use smartspend_core::{EngineConfig, IntelligenceEngine};

use crate::commands::{self, truncate};

fn setup_test_db() -> Database {
    Database::in_memory().unwrap()
}

fn engine() -> IntelligenceEngine {
    IntelligenceEngine::new(EngineConfig::default())
}

/// Write CSV content to a temp file, keeping it alive for the test
fn csv_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Five months of a steady 08:00 coffee plus a growing grocery bill
fn history_csv() -> String {
    let mut csv = String::from("date,amount,category,merchant\n");
    for (i, food) in [900.0, 950.0, 1000.0, 1050.0, 1800.0].iter().enumerate() {
        let month = i + 1;
        csv.push_str(&format!("2024-{:02}-12,{},Food,Grocer\n", month, food));
        csv.push_str(&format!("2024-{:02}-05 08:10:00,80,Coffee,Cafe\n", month));
    }
    csv
}

fn seeded_db() -> Database {
    let db = setup_test_db();
    let file = csv_file(&history_csv());
    commands::cmd_import(&db, 1, file.path(), false).unwrap();
    db
}

// ========== Expense Command Tests ==========

#[test]
fn test_cmd_import() {
    let db = setup_test_db();
    let file = csv_file(&history_csv());

    let result = commands::cmd_import(&db, 1, file.path(), false);
    assert!(result.is_ok());
    assert_eq!(db.count_expenses(1).unwrap(), 10);
    assert_eq!(db.count_expenses(2).unwrap(), 0);
}

#[test]
fn test_cmd_import_json() {
    let db = setup_test_db();
    let file = csv_file("date,amount,category\n2024-01-01,10,Food\n");
    assert!(commands::cmd_import(&db, 3, file.path(), true).is_ok());
    assert_eq!(db.count_expenses(3).unwrap(), 1);
}

#[test]
fn test_cmd_import_missing_file() {
    let db = setup_test_db();
    let result = commands::cmd_import(&db, 1, std::path::Path::new("/nonexistent/x.csv"), false);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Failed to open file"));
}

#[test]
fn test_cmd_import_bad_row_is_rejected() {
    let db = setup_test_db();
    let file = csv_file("date,amount,category\n2024-01-01,10,Food\n2024-01-02,-3,Food\n");

    let result = commands::cmd_import(&db, 1, file.path(), false);
    assert!(result.is_err());
    // Nothing from the file is stored
    assert_eq!(db.count_expenses(1).unwrap(), 0);
}

#[test]
fn test_cmd_add() {
    let db = setup_test_db();
    let result = commands::cmd_add(
        &db,
        1,
        250.0,
        "Dining",
        Some("2024-06-01 19:30:00"),
        Some("Bistro"),
        false,
    );
    assert!(result.is_ok());

    let expenses = db.list_expenses(1, None).unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].category, "Dining");
    assert_eq!(expenses[0].merchant.as_deref(), Some("Bistro"));
    assert_eq!(
        expenses[0].date.format("%Y-%m-%d %H:%M").to_string(),
        "2024-06-01 19:30"
    );
}

#[test]
fn test_cmd_add_defaults_to_now() {
    let db = setup_test_db();
    assert!(commands::cmd_add(&db, 1, 12.0, "Snacks", None, None, true).is_ok());
    assert_eq!(db.count_expenses(1).unwrap(), 1);
}

#[test]
fn test_cmd_add_rejects_invalid() {
    let db = setup_test_db();
    assert!(commands::cmd_add(&db, 1, -5.0, "Food", None, None, false).is_err());
    assert!(commands::cmd_add(&db, 1, 5.0, "   ", None, None, false).is_err());
    assert!(commands::cmd_add(&db, 1, 5.0, "Food", Some("yesterday"), None, false).is_err());
    assert_eq!(db.count_expenses(1).unwrap(), 0);
}

#[test]
fn test_cmd_expenses_list() {
    let db = setup_test_db();
    assert!(commands::cmd_expenses_list(&db, 1, 20, false).is_ok());

    let db = seeded_db();
    assert!(commands::cmd_expenses_list(&db, 1, 5, false).is_ok());
    assert!(commands::cmd_expenses_list(&db, 1, 5, true).is_ok());
}

// ========== Insight Command Tests ==========

#[test]
fn test_insight_commands_with_history() {
    let db = seeded_db();
    let engine = engine();

    for json in [false, true] {
        assert!(commands::cmd_forecast(&db, &engine, 1, json).is_ok());
        assert!(commands::cmd_risk(&db, &engine, 1, json).is_ok());
        assert!(commands::cmd_anomalies(&db, &engine, 1, json).is_ok());
        assert!(commands::cmd_recommend(&db, &engine, 1, json).is_ok());
        assert!(commands::cmd_alerts(&db, &engine, 1, json).is_ok());
        assert!(commands::cmd_explain(&db, &engine, 1, json).is_ok());
        assert!(commands::cmd_report(&db, &engine, 1, json).is_ok());
    }
}

#[test]
fn test_insight_commands_without_history() {
    let db = setup_test_db();
    let engine = engine();

    // Degraded results are not errors
    assert!(commands::cmd_forecast(&db, &engine, 9, false).is_ok());
    assert!(commands::cmd_risk(&db, &engine, 9, false).is_ok());
    assert!(commands::cmd_anomalies(&db, &engine, 9, false).is_ok());
    assert!(commands::cmd_report(&db, &engine, 9, false).is_ok());
}

// ========== Pattern Command Tests ==========

#[test]
fn test_cmd_learn_and_suggest_workflow() {
    let db = seeded_db();
    let engine = engine();

    commands::cmd_learn(&db, &engine, 1, false).unwrap();
    let patterns = db.list_patterns(1).unwrap();
    // Coffee is steady, Food swings too much to be a habit
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].category, "Coffee");
    assert_eq!(patterns[0].confidence, 0.5);

    // Below the 0.6 floor, so nothing is suggested yet
    commands::cmd_suggest(&db, &engine, 1, false).unwrap();
    assert!(db.list_suggestions(1, None).unwrap().is_empty());

    // A sixth coffee lifts confidence to 0.6
    commands::cmd_add(&db, 1, 80.0, "Coffee", Some("2024-06-05 08:05:00"), None, false).unwrap();
    commands::cmd_learn(&db, &engine, 1, true).unwrap();
    commands::cmd_suggest(&db, &engine, 1, false).unwrap();

    let pending = db
        .list_suggestions(1, Some(SuggestionStatus::Pending))
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].suggested_amount, 80.0);

    // Running again does not duplicate the pending suggestion
    commands::cmd_suggest(&db, &engine, 1, true).unwrap();
    assert_eq!(
        db.list_suggestions(1, Some(SuggestionStatus::Pending))
            .unwrap()
            .len(),
        1
    );

    assert!(commands::cmd_suggestions_list(&db, 1, "pending", false).is_ok());
    assert!(commands::cmd_suggestions_list(&db, 1, "all", true).is_ok());

    let before = db.count_expenses(1).unwrap();
    commands::cmd_suggestions_confirm(&db, 1, pending[0].id, false).unwrap();
    assert_eq!(db.count_expenses(1).unwrap(), before + 1);

    // Confirmed suggestions cannot be rejected
    let result = commands::cmd_suggestions_reject(&db, 1, pending[0].id);
    assert!(result.is_err());
}

#[test]
fn test_cmd_suggestions_reject() {
    let db = setup_test_db();
    let engine = engine();
    for day in 1..=6 {
        let date = format!("2024-03-{:02} 09:00:00", day);
        commands::cmd_add(&db, 1, 40.0, "Bus", Some(&date), None, false).unwrap();
    }
    commands::cmd_learn(&db, &engine, 1, false).unwrap();
    commands::cmd_suggest(&db, &engine, 1, false).unwrap();

    let pending = db
        .list_suggestions(1, Some(SuggestionStatus::Pending))
        .unwrap();
    assert_eq!(pending.len(), 1);

    commands::cmd_suggestions_reject(&db, 1, pending[0].id).unwrap();
    assert_eq!(
        db.list_suggestions(1, Some(SuggestionStatus::Rejected))
            .unwrap()
            .len(),
        1
    );
    assert_eq!(db.count_expenses(1).unwrap(), 6);
}

#[test]
fn test_cmd_suggestions_errors() {
    let db = setup_test_db();
    assert!(commands::cmd_suggestions_list(&db, 1, "bogus", false).is_err());
    assert!(commands::cmd_suggestions_confirm(&db, 1, 404, false).is_err());
    assert!(commands::cmd_suggestions_reject(&db, 1, 404).is_err());
}

// ========== Core Command Tests ==========

#[test]
fn test_open_db_and_init_unencrypted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");

    commands::cmd_init(&path, true).unwrap();
    assert!(path.exists());

    let db = commands::open_db(&path, true).unwrap();
    assert_eq!(db.count_expenses(1).unwrap(), 0);
    assert!(commands::cmd_status(&path, 1, true).is_ok());
}

#[test]
fn test_cmd_status_missing_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.db");
    assert!(commands::cmd_status(&path, 1, true).is_ok());
    assert!(!path.exists());
}

#[test]
fn test_load_engine_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[narrative]\ncurrency_symbol = \"$\"\n\n[budgets]\nFood = 1200.0"
    )
    .unwrap();

    let engine = commands::load_engine(Some(file.path())).unwrap();
    assert_eq!(engine.config().narrative.currency_symbol, "$");
    assert_eq!(engine.config().budgets.get("Food"), Some(&1200.0));
}

#[test]
fn test_load_engine_rejects_bad_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[forecast]\nmin_rows = \"many\"").unwrap();
    assert!(commands::load_engine(Some(file.path())).is_err());

    assert!(commands::load_engine(Some(std::path::Path::new("/nonexistent.toml"))).is_err());
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("Coffee", 10), "Coffee");
    assert_eq!(truncate("Neighborhood Grocer", 10), "Neighbo...");
    assert_eq!(truncate("₹₹₹₹₹₹", 5), "₹₹...");
}
