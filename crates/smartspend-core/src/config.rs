//! Engine configuration
//!
//! Every threshold the intelligence engine uses lives here, grouped by
//! component. Missing keys fall back to the built-in defaults.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a three-layer resolution:
//! 1. An explicit path (e.g. `smartspend --config engine.toml`)
//! 2. Override in data dir (~/.local/share/smartspend/config/engine.toml)
//! 3. Embedded defaults (compiled into binary)

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/engine.toml");

/// How months without any expenses are represented in the feature series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Inactive months are absent; month_index is compressed across gaps
    #[default]
    Skip,
    /// Inactive months between the first and last active month become
    /// zero-spend rows
    ZeroFill,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Minimum number of expense records before any features are produced
    pub min_records: usize,
    pub gap_policy: GapPolicy,
    /// Trailing window (rows) for the rolling volatility
    pub volatility_window: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            min_records: 3,
            gap_policy: GapPolicy::Skip,
            volatility_window: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Minimum monthly rows for a forecast
    pub min_rows: usize,
    /// Minimum monthly rows before the tree ensemble is fitted
    pub ensemble_min_rows: usize,
    pub linear_weight: f64,
    pub tree_weight: f64,
    pub n_trees: usize,
    pub max_depth: usize,
    pub seed: u64,
    /// Fraction of the previous month's spend that counts as a trend move
    pub trend_threshold: f64,
    /// Months of history that earn full confidence
    pub confidence_horizon_months: f64,
    pub min_confidence: f64,
    pub max_confidence_single: f64,
    pub max_confidence_ensemble: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            min_rows: 3,
            ensemble_min_rows: 5,
            linear_weight: 0.4,
            tree_weight: 0.6,
            n_trees: 50,
            max_depth: 3,
            seed: 42,
            trend_threshold: 0.05,
            confidence_horizon_months: 12.0,
            min_confidence: 0.3,
            max_confidence_single: 0.85,
            max_confidence_ensemble: 0.95,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub min_records: usize,
    /// Minimum months of data per category
    pub min_months: usize,
    /// Months averaged for the recent baseline
    pub recent_window: usize,
    /// Share of the last month-over-month change carried into the prediction
    pub trend_weight: f64,
    /// Multiplier on the recent average used as a synthesized budget
    pub budget_buffer: f64,
    pub high_threshold: f64,
    pub medium_threshold: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            min_records: 3,
            min_months: 2,
            recent_window: 3,
            trend_weight: 0.5,
            budget_buffer: 1.2,
            high_threshold: 0.9,
            medium_threshold: 0.7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    pub min_records: usize,
    /// Latest/previous monthly total ratio that counts as an overall spike
    pub overall_spike_ratio: f64,
    /// Latest/previous ratio that counts as a category spike
    pub category_spike_ratio: f64,
    /// Percentage increase above which a spike is HIGH severity
    pub high_severity_pct: f64,
    /// Growth over the last three months that counts as rapid growth
    pub rapid_growth_threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            min_records: 4,
            overall_spike_ratio: 1.4,
            category_spike_ratio: 1.3,
            high_severity_pct: 50.0,
            rapid_growth_threshold: 0.3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Minimum records per category (and overall) before learning
    pub min_occurrences: usize,
    /// Maximum (max - min) / mean spread for a stable habit
    pub max_spread_ratio: f64,
    /// Occurrences at which confidence reaches 1.0
    pub confidence_saturation: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            min_occurrences: 5,
            max_spread_ratio: 0.6,
            confidence_saturation: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    /// Minimum pattern confidence to propose an expense
    pub min_confidence: f64,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    pub currency_symbol: String,
    /// Number of most recent expenses averaged as "current spending"
    pub recent_window: usize,
    /// Forecast/recent ratio that triggers a review recommendation
    pub recommend_increase_ratio: f64,
    /// Forecast/recent ratio that triggers a FORECAST_EXCEED alert
    pub alert_increase_ratio: f64,
    pub max_risk_recommendations: usize,
    pub max_anomaly_recommendations: usize,
    /// Weekend/weekday average gap (percent) worth explaining
    pub weekend_gap_pct: f64,
    /// Volatility as a share of mean monthly spend worth explaining
    pub volatility_ratio: f64,
    /// Share of total spend (percent) that makes a category dominant
    pub dominant_category_pct: f64,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "₹".to_string(),
            recent_window: 30,
            recommend_increase_ratio: 1.2,
            alert_increase_ratio: 1.3,
            max_risk_recommendations: 2,
            max_anomaly_recommendations: 2,
            weekend_gap_pct: 20.0,
            volatility_ratio: 0.3,
            dominant_category_pct: 40.0,
        }
    }
}

/// Full engine configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub features: FeatureConfig,
    pub forecast: ForecastConfig,
    pub risk: RiskConfig,
    pub anomaly: AnomalyConfig,
    pub patterns: PatternConfig,
    pub suggestions: SuggestionConfig,
    pub narrative: NarrativeConfig,
    /// User-defined monthly budget limits by category
    pub budgets: BTreeMap<String, f64>,
}

impl EngineConfig {
    /// Load configuration (explicit path, then data-dir override, then defaults)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let content = match path {
            Some(path) => fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read {}: {}", path.display(), e))
            })?,
            None => match default_config_path() {
                Some(default_path) if default_path.exists() => {
                    debug!(path = %default_path.display(), "Loading config override");
                    fs::read_to_string(&default_path)
                        .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?
                }
                _ => DEFAULT_CONFIG.to_string(),
            },
        };

        parse_config(&content)
    }

    /// The embedded defaults
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("smartspend").join("config").join("engine.toml"))
}

/// Parse config from TOML content
pub fn parse_config(content: &str) -> Result<EngineConfig> {
    let config: EngineConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &EngineConfig) -> Result<()> {
    let forecast = &config.forecast;
    if forecast.linear_weight < 0.0
        || forecast.tree_weight < 0.0
        || forecast.linear_weight + forecast.tree_weight <= 0.0
    {
        return Err(Error::Config(
            "forecast weights must be non-negative and not both zero".to_string(),
        ));
    }
    if forecast.min_rows < 2 {
        return Err(Error::Config(
            "forecast.min_rows must be at least 2 (one row is held out)".to_string(),
        ));
    }
    if forecast.confidence_horizon_months <= 0.0 {
        return Err(Error::Config(
            "forecast.confidence_horizon_months must be positive".to_string(),
        ));
    }
    if config.features.volatility_window == 0 {
        return Err(Error::Config(
            "features.volatility_window must be at least 1".to_string(),
        ));
    }
    if config.risk.recent_window == 0 || config.risk.min_months < 2 {
        return Err(Error::Config(
            "risk.recent_window must be >= 1 and risk.min_months >= 2".to_string(),
        ));
    }
    if config.patterns.confidence_saturation == 0 {
        return Err(Error::Config(
            "patterns.confidence_saturation must be at least 1".to_string(),
        ));
    }
    if let Some((category, limit)) = config.budgets.iter().find(|(_, l)| **l < 0.0) {
        return Err(Error::Config(format!(
            "Budget for {} must not be negative (got {})",
            category, limit
        )));
    }
    Ok(())
}
