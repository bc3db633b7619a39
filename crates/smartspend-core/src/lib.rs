//! SmartSpend Core Library
//!
//! Financial intelligence over a personal expense history:
//! - Database access and migrations (SQLCipher via r2d2)
//! - CSV expense import
//! - Intelligence engine: features, forecasting, budget risk, anomalies,
//!   recommendations, alerts and explanations
//! - Recurring pattern learner and suggestion generator
//! - Engine configuration with embedded defaults

pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod insights;
pub mod models;
pub mod patterns;
pub mod suggestions;

pub use config::{EngineConfig, GapPolicy};
pub use db::Database;
pub use error::{Error, Result};
pub use insights::{BudgetLimits, InsightReport, IntelligenceEngine};
pub use models::{
    Alert, AlertType, AnomalyInsight, AnomalyKind, CategoryRisk, Expense, ExpensePattern,
    ExpenseRecord, ExpenseSuggestion, ForecastResult, LearnedPattern, NewExpense, Recommendation,
    RiskLevel, Severity, SuggestionStatus, Trend,
};
pub use patterns::{learn_patterns, mine_patterns, LearnSummary};
pub use suggestions::generate_suggestions;
