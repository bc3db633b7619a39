//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// SmartSpend - Financial intelligence for your expenses
#[derive(Parser)]
#[command(name = "smartspend")]
#[command(about = "Expense forecasting, budget risk and anomaly insights", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "smartspend.db", global = true)]
    pub db: PathBuf,

    /// User whose expenses are analyzed
    #[arg(short, long, default_value = "1", global = true)]
    pub user: i64,

    /// Engine config file (TOML). Defaults to the data-dir override, then
    /// the built-in defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set SMARTSPEND_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Import expenses from CSV (date,amount,category[,merchant])
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Record a single expense
    Add {
        /// Amount spent (non-negative)
        #[arg(short, long)]
        amount: f64,

        /// Spending category
        #[arg(short, long)]
        category: String,

        /// When it happened (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS, defaults to now)
        #[arg(short, long)]
        date: Option<String>,

        /// Merchant or shop name
        #[arg(short, long)]
        merchant: Option<String>,
    },

    /// List recent expenses
    Expenses {
        /// Maximum number of expenses to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Forecast next month's spending
    Forecast,

    /// Show per-category budget risk
    Risk,

    /// Detect spending anomalies
    Anomalies,

    /// Show recommendations
    Recommend,

    /// Show alerts
    Alerts,

    /// Explain recent spending behavior
    Explain,

    /// Full insight report (forecast, risk, anomalies, recommendations, alerts)
    Report,

    /// Learn recurring expense patterns from history
    Learn,

    /// Create suggestions from learned patterns
    Suggest,

    /// Manage expense suggestions (list, confirm, reject)
    Suggestions {
        #[command(subcommand)]
        action: Option<SuggestionsAction>,
    },

    /// Show database status (encryption, size, counts)
    Status,
}

#[derive(Subcommand)]
pub enum SuggestionsAction {
    /// List suggestions
    List {
        /// Filter by status: pending, confirmed, rejected, all
        #[arg(short, long, default_value = "pending")]
        status: String,
    },

    /// Confirm a pending suggestion, recording it as an expense
    Confirm {
        /// Suggestion ID
        id: i64,
    },

    /// Reject a pending suggestion
    Reject {
        /// Suggestion ID
        id: i64,
    },
}
