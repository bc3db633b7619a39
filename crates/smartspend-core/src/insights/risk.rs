//! Per-category budget risk
//!
//! Each category's next-month spend is projected from its recent average plus
//! half of the latest month-over-month change, then compared with a budget
//! limit. The limit comes from the user when one is set; otherwise it is
//! synthesized from recent spending.

use std::collections::BTreeMap;

use super::features::{category_monthly, category_series, mean, CategoryMonthlyRow};
use super::round2;
use crate::config::RiskConfig;
use crate::models::{BudgetSource, CategoryRisk, ExpenseRecord, RiskLevel};

/// User-defined monthly budget limits by category
pub type BudgetLimits = BTreeMap<String, f64>;

/// Budget risk for every category, highest probability first
///
/// Empty when the history has fewer than `config.min_records` records.
pub fn assess_budget_risk(
    history: &[ExpenseRecord],
    budgets: Option<&BudgetLimits>,
    config: &RiskConfig,
) -> Vec<CategoryRisk> {
    if history.len() < config.min_records {
        return Vec::new();
    }
    score_categories(&category_monthly(history), budgets, config)
}

/// Score precomputed category rows (no minimum-history check)
pub fn score_categories(
    rows: &[CategoryMonthlyRow],
    budgets: Option<&BudgetLimits>,
    config: &RiskConfig,
) -> Vec<CategoryRisk> {
    let mut risks: Vec<CategoryRisk> = category_series(rows)
        .into_iter()
        .filter_map(|(category, spends)| score_category(category, &spends, budgets, config))
        .collect();

    risks.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    risks
}

fn score_category(
    category: String,
    spends: &[f64],
    budgets: Option<&BudgetLimits>,
    config: &RiskConfig,
) -> Option<CategoryRisk> {
    let [.., previous, last] = spends else {
        return None;
    };
    if spends.len() < config.min_months {
        return None;
    }

    let recent = &spends[spends.len().saturating_sub(config.recent_window)..];
    let recent_avg = mean(recent);
    let trend = last - previous;
    let predicted = (recent_avg + trend * config.trend_weight).max(0.0);

    let (budget_limit, budget_source) = match budgets.and_then(|b| b.get(&category)) {
        Some(&limit) => (limit, BudgetSource::User),
        None => (recent_avg * config.budget_buffer, BudgetSource::Synthesized),
    };
    if budget_limit <= 0.0 {
        return None;
    }

    let probability = (predicted / budget_limit).min(1.0);
    let risk_level = if probability >= config.high_threshold {
        RiskLevel::High
    } else if probability >= config.medium_threshold {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    Some(CategoryRisk {
        category,
        risk_level,
        probability: round2(probability),
        expected_spend: round2(predicted),
        budget_limit: round2(budget_limit),
        budget_source,
    })
}
