//! Financial Intelligence Engine
//!
//! Turns a user's expense history into forward-looking insight. Everything in
//! this module is a pure function of the history it is handed; nothing here
//! touches the database.
//!
//! ## Components
//!
//! - **Features** - monthly aggregation, rolling volatility, category breakdown
//! - **Forecaster** - next-month total from a linear model and bagged trees
//! - **Risk** - per-category projected spend against a budget limit
//! - **Anomaly** - month-over-month spikes and three-month growth
//! - **Recommendations / Alerts / Explainer** - human-readable synthesis
//!
//! ## Usage
//!
//! ```rust,ignore
//! use smartspend_core::insights::IntelligenceEngine;
//!
//! let engine = IntelligenceEngine::new(config);
//! let history = db.list_expense_history(user_id)?;
//! let report = engine.report(&history);
//! ```

pub mod alerts;
pub mod anomaly;
pub mod engine;
pub mod explainer;
pub mod features;
pub mod forecaster;
pub mod recommendations;
pub mod regression;
pub mod risk;

pub use anomaly::detect_anomalies;
pub use engine::{InsightReport, IntelligenceEngine};
pub use features::{
    category_monthly, engineer_features, monthly_totals, CategoryMonthlyRow, FeatureSet,
    MonthlyFeatureRow,
};
pub use forecaster::forecast_spending;
pub use regression::{
    BaggedTrees, DefaultRegressorFactory, LinearRegression, RegressorFactory, SpendRegressor,
};
pub use risk::{assess_budget_risk, BudgetLimits};

use crate::models::ExpenseRecord;

/// Round to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean amount of the `window` most recent records (0 for an empty history)
pub fn recent_average(history: &[ExpenseRecord], window: usize) -> f64 {
    let recent: Vec<f64> = history[history.len().saturating_sub(window)..]
        .iter()
        .map(|r| r.amount)
        .collect();
    features::mean(&recent)
}
