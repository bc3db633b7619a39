//! Next-month spending forecast
//!
//! The last monthly row is held out. The remaining rows train a linear model,
//! plus a tree ensemble once the history is long enough. Each model predicts
//! from the held-out row's feature vector and the predictions are blended.

use tracing::{debug, warn};

use super::features::MonthlyFeatureRow;
use super::regression::{FeatureVector, RegressorFactory, SpendRegressor};
use super::round2;
use crate::config::ForecastConfig;
use crate::models::{ForecastResult, Trend};

pub const INSUFFICIENT_DATA_MESSAGE: &str = "Insufficient data (need at least 3 months)";
const NO_MODEL_MESSAGE: &str = "No forecasting model could be fitted";

struct Prediction {
    model: String,
    value: f64,
}

/// Fit one model on the training split and predict for the held-out row
fn fit_and_predict(
    mut model: Box<dyn SpendRegressor>,
    train_x: &[FeatureVector],
    train_y: &[f64],
    target: &FeatureVector,
) -> Option<Prediction> {
    match model.fit(train_x, train_y) {
        Ok(()) => {
            let value = model.predict(target);
            if value.is_finite() {
                debug!(model = model.name(), prediction = value, "Model fitted");
                Some(Prediction {
                    model: model.name().to_string(),
                    value,
                })
            } else {
                warn!(model = model.name(), "Model produced a non-finite prediction");
                None
            }
        }
        Err(e) => {
            warn!(model = model.name(), error = %e, "Model fit failed, dropping it");
            None
        }
    }
}

/// Direction of the latest month-over-month change
///
/// A change larger than `threshold` times the previous month's spend is a
/// move; anything smaller is STABLE.
pub fn spending_trend(rows: &[MonthlyFeatureRow], threshold: f64) -> Trend {
    let [.., previous, last] = rows else {
        return Trend::Stable;
    };
    let band = previous.total_spend * threshold;
    if last.spend_change > band {
        Trend::Up
    } else if last.spend_change < -band {
        Trend::Down
    } else {
        Trend::Stable
    }
}

/// Forecast next month's total spend from the monthly feature rows
pub fn forecast_spending(
    rows: &[MonthlyFeatureRow],
    config: &ForecastConfig,
    factory: &dyn RegressorFactory,
) -> ForecastResult {
    if rows.len() < config.min_rows {
        return ForecastResult::insufficient(INSUFFICIENT_DATA_MESSAGE);
    }

    let features: Vec<FeatureVector> = rows.iter().map(|r| r.feature_vector()).collect();
    let targets: Vec<f64> = rows.iter().map(|r| r.total_spend).collect();
    let held_out = rows.len() - 1;
    let (train_x, train_y) = (&features[..held_out], &targets[..held_out]);
    let target = &features[held_out];

    let linear = fit_and_predict(factory.linear(config), train_x, train_y, target);
    let ensemble = if rows.len() >= config.ensemble_min_rows {
        fit_and_predict(factory.ensemble(config), train_x, train_y, target)
    } else {
        None
    };

    let months = rows.len() as f64 / config.confidence_horizon_months;
    let (predicted, confidence, models) = match (linear, ensemble) {
        (Some(a), Some(b)) => {
            let total_weight = config.linear_weight + config.tree_weight;
            let blended =
                (config.linear_weight * a.value + config.tree_weight * b.value) / total_weight;
            let agreement = 1.0 - (a.value - b.value).abs() / (a.value.max(b.value) + 1.0);
            let confidence = (agreement * months)
                .max(config.min_confidence)
                .min(config.max_confidence_ensemble);
            (blended, confidence, vec![a.model, b.model])
        }
        (Some(only), None) | (None, Some(only)) => {
            let confidence = months
                .max(config.min_confidence)
                .min(config.max_confidence_single);
            (only.value, confidence, vec![only.model])
        }
        (None, None) => return ForecastResult::insufficient(NO_MODEL_MESSAGE),
    };

    ForecastResult {
        predicted_amount: round2(predicted.max(0.0)),
        confidence: round2(confidence),
        trend: spending_trend(rows, config.trend_threshold),
        message: None,
        models,
    }
}
