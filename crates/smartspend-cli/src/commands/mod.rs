//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init, status) and shared utilities (open_db, load_engine)
//! - `expenses` - Expense commands (import, add, list)
//! - `insights` - Engine commands (forecast, risk, anomalies, recommend, alerts, explain, report)
//! - `patterns` - Pattern learning and suggestion workflow (learn, suggest, suggestions)

pub mod core;
pub mod expenses;
pub mod insights;
pub mod patterns;

// Re-export command functions for main.rs
pub use core::*;
pub use expenses::*;
pub use insights::*;
pub use patterns::*;

use anyhow::Result;
use serde::Serialize;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Print a value as pretty JSON (for `--json`)
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
