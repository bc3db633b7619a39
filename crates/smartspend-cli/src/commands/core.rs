//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `load_engine` - Build the intelligence engine from config
//! - `cmd_init` - Initialize the database
//! - `cmd_status` - Database and per-user status

use std::path::Path;

use anyhow::{Context, Result};
use smartspend_core::db::{Database, DB_KEY_ENV};
use smartspend_core::models::SuggestionStatus;
use smartspend_core::{EngineConfig, IntelligenceEngine};

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Load engine configuration (explicit path, data-dir override, or defaults)
pub fn load_engine(config_path: Option<&Path>) -> Result<IntelligenceEngine> {
    let config = EngineConfig::load(config_path).context("Failed to load engine config")?;
    Ok(IntelligenceEngine::new(config))
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_db(db_path, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Import expenses: smartspend import --file expenses.csv");
    println!("  2. See insights:    smartspend report");

    Ok(())
}

pub fn cmd_status(db_path: &Path, user_id: i64, no_encrypt: bool) -> Result<()> {
    use std::fs;

    println!();
    println!("📊 SmartSpend Status");
    println!("   ─────────────────────────────────────────────────────────────");

    println!("   Database: {}", db_path.display());

    if db_path.exists() {
        if let Ok(metadata) = fs::metadata(db_path) {
            let size_kb = metadata.len() as f64 / 1024.0;
            if size_kb < 1024.0 {
                println!("   Size: {:.1} KB", size_kb);
            } else {
                println!("   Size: {:.1} MB", size_kb / 1024.0);
            }
        }
    } else {
        println!("   Size: (database not initialized)");
    }

    let has_key = std::env::var(DB_KEY_ENV).is_ok();
    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else if has_key {
        println!("   🔒 Encryption: ENABLED ({}=***)", DB_KEY_ENV);
    } else {
        println!("   ❌ Encryption: REQUIRED but {} not set", DB_KEY_ENV);
    }

    if db_path.exists() {
        match open_db(db_path, no_encrypt) {
            Ok(db) => {
                let expenses = db.count_expenses(user_id)?;
                let patterns = db.list_patterns(user_id)?.len();
                let pending = db
                    .list_suggestions(user_id, Some(SuggestionStatus::Pending))?
                    .len();
                println!();
                println!("   User: {}", user_id);
                println!("   Expenses: {}", expenses);
                println!("   Learned patterns: {}", patterns);
                println!("   Pending suggestions: {}", pending);
            }
            Err(e) => {
                println!();
                println!("   ❌ Error opening database: {}", e);
                if !no_encrypt && !has_key {
                    println!("      Set {} or use --no-encrypt", DB_KEY_ENV);
                } else if has_key {
                    println!("      (Check if {} is correct)", DB_KEY_ENV);
                }
            }
        }
    }

    println!();
    Ok(())
}
