//! Intelligence Engine - runs the analysis branch over one user's history

use serde::Serialize;
use tracing::debug;

use super::alerts::build_alerts;
use super::anomaly::detect_in_series;
use super::explainer::explain_spending;
use super::features::{monthly_totals, FeatureSet};
use super::forecaster::forecast_spending;
use super::recommendations::build_recommendations;
use super::regression::{DefaultRegressorFactory, RegressorFactory};
use super::risk::{score_categories, BudgetLimits};
use super::recent_average;
use crate::config::EngineConfig;
use crate::models::{
    Alert, AnomalyInsight, CategoryRisk, ExpenseRecord, ForecastResult, Recommendation,
};

/// Everything the engine can say about a history, computed in one pass
#[derive(Debug, Clone, Serialize)]
pub struct InsightReport {
    pub forecast: ForecastResult,
    pub risks: Vec<CategoryRisk>,
    pub anomalies: Vec<AnomalyInsight>,
    pub recommendations: Vec<Recommendation>,
    pub alerts: Vec<Alert>,
    pub explanations: Vec<String>,
}

/// The financial intelligence engine
///
/// Stateless apart from its configuration: every operation takes the
/// history it works on, ordered by date ascending.
pub struct IntelligenceEngine {
    config: EngineConfig,
    factory: Box<dyn RegressorFactory>,
}

impl Default for IntelligenceEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl IntelligenceEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_factory(config, Box::new(DefaultRegressorFactory))
    }

    /// Use a custom model factory (e.g. fixed-output models in tests)
    pub fn with_factory(config: EngineConfig, factory: Box<dyn RegressorFactory>) -> Self {
        Self { config, factory }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn budgets(&self) -> Option<&BudgetLimits> {
        (!self.config.budgets.is_empty()).then_some(&self.config.budgets)
    }

    fn features(&self, history: &[ExpenseRecord]) -> FeatureSet {
        FeatureSet::build(history, &self.config.features)
    }

    fn forecast_from(&self, features: &FeatureSet) -> ForecastResult {
        forecast_spending(&features.monthly, &self.config.forecast, self.factory.as_ref())
    }

    fn risks_from(&self, history: &[ExpenseRecord], features: &FeatureSet) -> Vec<CategoryRisk> {
        if history.len() < self.config.risk.min_records {
            return Vec::new();
        }
        score_categories(&features.category_monthly, self.budgets(), &self.config.risk)
    }

    fn anomalies_from(
        &self,
        history: &[ExpenseRecord],
        features: &FeatureSet,
    ) -> Vec<AnomalyInsight> {
        if history.len() < self.config.anomaly.min_records {
            return Vec::new();
        }
        let totals = monthly_totals(history, self.config.features.gap_policy);
        detect_in_series(&totals, &features.category_monthly, &self.config.anomaly)
    }

    fn recent_avg(&self, history: &[ExpenseRecord]) -> f64 {
        recent_average(history, self.config.narrative.recent_window)
    }

    /// Predict next month's total spend
    pub fn forecast(&self, history: &[ExpenseRecord]) -> ForecastResult {
        self.forecast_from(&self.features(history))
    }

    /// Per-category budget risk, highest probability first
    pub fn assess_budget_risk(&self, history: &[ExpenseRecord]) -> Vec<CategoryRisk> {
        self.risks_from(history, &self.features(history))
    }

    /// Spikes and rapid growth
    pub fn detect_anomalies(&self, history: &[ExpenseRecord]) -> Vec<AnomalyInsight> {
        self.anomalies_from(history, &self.features(history))
    }

    pub fn recommend(&self, history: &[ExpenseRecord]) -> Vec<Recommendation> {
        let features = self.features(history);
        build_recommendations(
            &self.forecast_from(&features),
            &self.risks_from(history, &features),
            &self.anomalies_from(history, &features),
            self.recent_avg(history),
            &self.config.narrative,
        )
    }

    pub fn alert(&self, history: &[ExpenseRecord]) -> Vec<Alert> {
        let features = self.features(history);
        build_alerts(
            &self.forecast_from(&features),
            &self.risks_from(history, &features),
            &self.anomalies_from(history, &features),
            self.recent_avg(history),
            &self.config.narrative,
        )
    }

    pub fn explain(&self, history: &[ExpenseRecord]) -> Vec<String> {
        explain_spending(
            &self.features(history).monthly,
            history,
            &self.config.narrative,
        )
    }

    /// Run every analysis once and bundle the results
    pub fn report(&self, history: &[ExpenseRecord]) -> InsightReport {
        let features = self.features(history);
        let forecast = self.forecast_from(&features);
        let risks = self.risks_from(history, &features);
        let anomalies = self.anomalies_from(history, &features);
        let recent_avg = self.recent_avg(history);

        let recommendations = build_recommendations(
            &forecast,
            &risks,
            &anomalies,
            recent_avg,
            &self.config.narrative,
        );
        let alerts = build_alerts(
            &forecast,
            &risks,
            &anomalies,
            recent_avg,
            &self.config.narrative,
        );
        let explanations = explain_spending(&features.monthly, history, &self.config.narrative);

        debug!(
            records = history.len(),
            months = features.monthly.len(),
            risks = risks.len(),
            anomalies = anomalies.len(),
            alerts = alerts.len(),
            "Insight report complete"
        );

        InsightReport {
            forecast,
            risks,
            anomalies,
            recommendations,
            alerts,
            explanations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::insights::explainer::INSUFFICIENT_HISTORY_REASON;
    use crate::insights::recommendations::HEALTHY_MESSAGE;
    use crate::insights::regression::{FeatureVector, SpendRegressor};
    use crate::models::{AlertType, AnomalyKind, Severity, Trend};
    use chrono::NaiveDate;

    struct Flat(f64);

    impl SpendRegressor for Flat {
        fn name(&self) -> &str {
            "flat"
        }
        fn fit(&mut self, _: &[FeatureVector], _: &[f64]) -> Result<()> {
            Ok(())
        }
        fn predict(&self, _: &FeatureVector) -> f64 {
            self.0
        }
    }

    struct FlatFactory(f64);

    impl RegressorFactory for FlatFactory {
        fn linear(&self, _: &crate::config::ForecastConfig) -> Box<dyn SpendRegressor> {
            Box::new(Flat(self.0))
        }
        fn ensemble(&self, _: &crate::config::ForecastConfig) -> Box<dyn SpendRegressor> {
            Box::new(Flat(self.0))
        }
    }

    fn food_history(totals: &[f64]) -> Vec<ExpenseRecord> {
        totals
            .iter()
            .enumerate()
            .map(|(i, total)| {
                ExpenseRecord::new(
                    NaiveDate::from_ymd_opt(2024, i as u32 + 1, 10)
                        .unwrap()
                        .and_hms_opt(12, 0, 0)
                        .unwrap(),
                    *total,
                    "Food",
                )
            })
            .collect()
    }

    #[test]
    fn test_empty_history_degrades_gracefully() {
        let engine = IntelligenceEngine::default();
        let report = engine.report(&[]);

        assert!(report.forecast.is_insufficient());
        assert_eq!(report.forecast.trend, Trend::Stable);
        assert!(report.risks.is_empty());
        assert!(report.anomalies.is_empty());
        assert!(report.alerts.is_empty());
        assert_eq!(report.recommendations.len(), 1);
        assert_eq!(report.recommendations[0].suggestion, HEALTHY_MESSAGE);
        assert_eq!(report.explanations, vec![INSUFFICIENT_HISTORY_REASON]);
    }

    #[test]
    fn test_report_matches_individual_operations() {
        let engine =
            IntelligenceEngine::with_factory(EngineConfig::default(), Box::new(FlatFactory(2500.0)));
        let history = food_history(&[1000.0, 1050.0, 1100.0, 1150.0, 1600.0, 1650.0]);

        let report = engine.report(&history);
        assert_eq!(report.forecast, engine.forecast(&history));
        assert_eq!(report.risks, engine.assess_budget_risk(&history));
        assert_eq!(report.anomalies, engine.detect_anomalies(&history));
        assert_eq!(report.recommendations, engine.recommend(&history));
        assert_eq!(report.alerts, engine.alert(&history));
        assert_eq!(report.explanations, engine.explain(&history));
    }

    #[test]
    fn test_food_scenario() {
        let engine =
            IntelligenceEngine::with_factory(EngineConfig::default(), Box::new(FlatFactory(2500.0)));
        // Latest Food jump 1000 -> 1350 (+35%)
        let history = food_history(&[1000.0, 1050.0, 1100.0, 1000.0, 1350.0]);

        let anomalies = engine.detect_anomalies(&history);
        // One category, so the overall and Food series match: +35% is above
        // the category ratio but below the overall one
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].kind, AnomalyKind::Spike);
        assert_eq!(anomalies[0].category, "Food");
        assert_eq!(anomalies[0].severity, Severity::Medium);

        let forecast = engine.forecast(&history);
        assert_eq!(forecast.trend, Trend::Up);
        assert_eq!(forecast.predicted_amount, 2500.0);

        // Recent average 1100: 2500 exceeds both thresholds
        let alerts = engine.alert(&history);
        assert!(alerts
            .iter()
            .any(|a| a.alert_type == AlertType::ForecastExceed));
        let recs = engine.recommend(&history);
        assert!(recs[0].suggestion.starts_with("Expected spending increase of ₹1400"));
    }

    #[test]
    fn test_user_budgets_flow_into_risk() {
        let mut config = EngineConfig::default();
        config.budgets.insert("Food".to_string(), 10_000.0);
        let engine = IntelligenceEngine::new(config);

        let risks = engine.assess_budget_risk(&food_history(&[1000.0, 1100.0, 1200.0]));
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].budget_limit, 10_000.0);
    }
}
