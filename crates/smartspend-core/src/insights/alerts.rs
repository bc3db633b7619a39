//! Automated alerts

use super::anomaly::OVERALL_CATEGORY;
use crate::config::NarrativeConfig;
use crate::models::{
    Alert, AlertType, AnomalyInsight, CategoryRisk, ForecastResult, RiskLevel, Severity,
};

/// Alerts for high budget risk, a forecast well above recent spending, and
/// high-severity anomalies (in that order)
pub fn build_alerts(
    forecast: &ForecastResult,
    risks: &[CategoryRisk],
    anomalies: &[AnomalyInsight],
    recent_avg: f64,
    config: &NarrativeConfig,
) -> Vec<Alert> {
    let symbol = &config.currency_symbol;
    let mut alerts: Vec<Alert> = risks
        .iter()
        .filter(|r| r.risk_level == RiskLevel::High)
        .map(|r| Alert {
            alert_type: AlertType::BudgetRisk,
            severity: Severity::High,
            message: format!(
                "{} budget likely to exceed next month (expected: {}{:.0})",
                r.category, symbol, r.expected_spend
            ),
            category: r.category.clone(),
        })
        .collect();

    if forecast.predicted_amount > 0.0
        && recent_avg > 0.0
        && forecast.predicted_amount > recent_avg * config.alert_increase_ratio
    {
        alerts.push(Alert {
            alert_type: AlertType::ForecastExceed,
            severity: Severity::Medium,
            message: format!(
                "Next month's predicted spending ({}{:.0}) is significantly higher than recent average",
                symbol, forecast.predicted_amount
            ),
            category: OVERALL_CATEGORY.to_string(),
        });
    }

    alerts.extend(
        anomalies
            .iter()
            .filter(|i| i.severity == Severity::High)
            .map(|i| Alert {
                alert_type: AlertType::AbnormalSpending,
                severity: Severity::High,
                message: i.message.clone(),
                category: i.category.clone(),
            }),
    );

    alerts
}
