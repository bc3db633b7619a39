//! Actionable recommendations built from the forecast, risks and anomalies

use crate::config::NarrativeConfig;
use crate::models::{
    AnomalyInsight, AnomalyKind, CategoryRisk, ForecastResult, Recommendation, RiskLevel, Severity,
};

pub const HEALTHY_MESSAGE: &str =
    "Your spending patterns look healthy. Keep tracking your expenses!";

/// Build recommendations; always returns at least one item
///
/// `recent_avg` is the mean amount of the most recent expenses.
pub fn build_recommendations(
    forecast: &ForecastResult,
    risks: &[CategoryRisk],
    anomalies: &[AnomalyInsight],
    recent_avg: f64,
    config: &NarrativeConfig,
) -> Vec<Recommendation> {
    let symbol = &config.currency_symbol;
    let mut recommendations = Vec::new();

    if forecast.predicted_amount > 0.0
        && recent_avg > 0.0
        && forecast.predicted_amount > recent_avg * config.recommend_increase_ratio
    {
        let diff = forecast.predicted_amount - recent_avg;
        recommendations.push(Recommendation {
            suggestion: format!(
                "Expected spending increase of {}{:.0} next month. Consider reviewing discretionary expenses.",
                symbol, diff
            ),
            priority: Severity::High,
        });
    }

    for risk in risks
        .iter()
        .filter(|r| r.risk_level == RiskLevel::High)
        .take(config.max_risk_recommendations)
    {
        let reduction = risk.expected_spend - risk.budget_limit;
        if reduction > 0.0 {
            recommendations.push(Recommendation {
                suggestion: format!(
                    "Reduce {} expenses by {}{:.0} to stay within your monthly budget.",
                    risk.category, symbol, reduction
                ),
                priority: Severity::High,
            });
        }
    }

    // Only spikes among the leading insights count
    for insight in anomalies
        .iter()
        .take(config.max_anomaly_recommendations)
        .filter(|i| i.kind == AnomalyKind::Spike)
    {
        recommendations.push(Recommendation {
            suggestion: format!(
                "Monitor {} spending - significant increase detected.",
                insight.category
            ),
            priority: insight.severity,
        });
    }

    if recommendations.is_empty() {
        recommendations.push(Recommendation {
            suggestion: HEALTHY_MESSAGE.to_string(),
            priority: Severity::Low,
        });
    }

    recommendations
}
