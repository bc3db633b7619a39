//! Domain models for SmartSpend

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Frequency written for every learned pattern
pub const PATTERN_FREQUENCY_DAILY: &str = "daily";

/// Source tag for suggestions produced by the pattern learner
pub const SUGGESTION_SOURCE_PATTERN: &str = "pattern";

/// A single expense as seen by the intelligence engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub date: NaiveDateTime,
    /// Always >= 0, validated before it reaches the engine
    pub amount: f64,
    pub category: String,
}

impl ExpenseRecord {
    pub fn new(date: NaiveDateTime, amount: f64, category: impl Into<String>) -> Self {
        Self {
            date,
            amount,
            category: category.into(),
        }
    }
}

/// A stored expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDateTime,
    pub amount: f64,
    pub category: String,
    /// Merchant or shop name, if known
    pub merchant: Option<String>,
    /// Created automatically (confirmed suggestion) rather than typed in
    pub is_auto: bool,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// The engine's read-only view of this expense
    pub fn record(&self) -> ExpenseRecord {
        ExpenseRecord::new(self.date, self.amount, self.category.clone())
    }
}

/// New expense to insert
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub date: NaiveDateTime,
    pub amount: f64,
    pub category: String,
    pub merchant: Option<String>,
    pub is_auto: bool,
}

impl NewExpense {
    pub fn new(date: NaiveDateTime, amount: f64, category: impl Into<String>) -> Self {
        Self {
            date,
            amount,
            category: category.into(),
            merchant: None,
            is_auto: false,
        }
    }

    pub fn with_merchant(mut self, merchant: impl Into<String>) -> Self {
        self.merchant = Some(merchant.into());
        self
    }

    /// Boundary validation: the engine assumes non-negative finite amounts
    /// and non-empty categories.
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(Error::InvalidData(format!(
                "Expense amount must be a non-negative number, got {}",
                self.amount
            )));
        }
        if self.category.trim().is_empty() {
            return Err(Error::InvalidData(
                "Expense category must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Direction of the most recent month-over-month change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Stable => "STABLE",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Budget risk level for a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity of an insight or alert, also used as recommendation priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }

    /// Numeric priority for sorting (higher = more urgent)
    pub fn priority(&self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of spending anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyKind {
    /// Month-over-month jump
    Spike,
    /// Sustained growth over the last three months
    RapidGrowth,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spike => "SPIKE",
            Self::RapidGrowth => "RAPID_GROWTH",
        }
    }
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Types of alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    BudgetRisk,
    ForecastExceed,
    AbnormalSpending,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BudgetRisk => "BUDGET_RISK",
            Self::ForecastExceed => "FORECAST_EXCEED",
            Self::AbnormalSpending => "ABNORMAL_SPENDING",
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a category's budget limit came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetSource {
    /// Limit set by the user
    User,
    /// Derived from recent spending (recent average plus buffer)
    Synthesized,
}

/// Next-month spending forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub predicted_amount: f64,
    /// 0.0 only when there was not enough history to forecast
    pub confidence: f64,
    pub trend: Trend,
    /// Set when the forecast degraded (e.g. insufficient data)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Names of the models that contributed to the prediction
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<String>,
}

impl ForecastResult {
    /// Degraded result for users without enough history
    pub fn insufficient(message: impl Into<String>) -> Self {
        Self {
            predicted_amount: 0.0,
            confidence: 0.0,
            trend: Trend::Stable,
            message: Some(message.into()),
            models: Vec::new(),
        }
    }

    pub fn is_insufficient(&self) -> bool {
        self.confidence == 0.0
    }
}

/// Near-term budget risk for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRisk {
    pub category: String,
    pub risk_level: RiskLevel,
    pub probability: f64,
    pub expected_spend: f64,
    pub budget_limit: f64,
    pub budget_source: BudgetSource,
}

/// A detected spending anomaly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyInsight {
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub category: String,
    pub message: String,
    pub severity: Severity,
}

/// An actionable recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub suggestion: String,
    pub priority: Severity,
}

/// An automated alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    pub category: String,
}

/// A learned recurring spending habit for one (user, category)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpensePattern {
    pub id: i64,
    pub user_id: i64,
    pub category: String,
    pub avg_amount: f64,
    pub min_amount: f64,
    pub max_amount: f64,
    /// Inclusive hour-of-day window (0-23)
    pub preferred_hour_start: u32,
    pub preferred_hour_end: u32,
    pub frequency: String,
    /// 0.0-1.0, saturates at 10 observations
    pub confidence: f64,
    pub updated_at: DateTime<Utc>,
}

/// Suggestion lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl SuggestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for SuggestionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("Unknown suggestion status: {}", s)),
        }
    }
}

impl std::fmt::Display for SuggestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A proposed expense awaiting user confirmation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseSuggestion {
    pub id: i64,
    pub user_id: i64,
    pub category: String,
    pub suggested_amount: f64,
    pub suggested_date: DateTime<Utc>,
    pub status: SuggestionStatus,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// A habit mined from history, before it is written to the database
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearnedPattern {
    pub category: String,
    pub avg_amount: f64,
    pub min_amount: f64,
    pub max_amount: f64,
    pub preferred_hour_start: u32,
    pub preferred_hour_end: u32,
    pub confidence: f64,
    /// Records the pattern was learned from
    pub occurrences: usize,
}

/// New suggestion to insert (status starts as pending)
#[derive(Debug, Clone)]
pub struct NewSuggestion {
    pub category: String,
    pub suggested_amount: f64,
    pub suggested_date: DateTime<Utc>,
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_new_expense_validation() {
        assert!(NewExpense::new(noon(), 0.0, "Food").validate().is_ok());
        assert!(NewExpense::new(noon(), -1.0, "Food").validate().is_err());
        assert!(NewExpense::new(noon(), f64::NAN, "Food").validate().is_err());
        assert!(NewExpense::new(noon(), 10.0, "  ").validate().is_err());
    }

    #[test]
    fn test_wire_names() {
        let insight = AnomalyInsight {
            kind: AnomalyKind::RapidGrowth,
            category: "Overall".to_string(),
            message: "m".to_string(),
            severity: Severity::High,
        };
        let json = serde_json::to_value(&insight).unwrap();
        assert_eq!(json["type"], "RAPID_GROWTH");
        assert_eq!(json["severity"], "HIGH");

        let alert = Alert {
            alert_type: AlertType::ForecastExceed,
            severity: Severity::Medium,
            message: "m".to_string(),
            category: "Overall".to_string(),
        };
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["alert_type"], "FORECAST_EXCEED");
        assert_eq!(serde_json::to_value(Trend::Stable).unwrap(), "STABLE");
    }

    #[test]
    fn test_suggestion_status_parse() {
        assert_eq!(
            SuggestionStatus::from_str("Pending").unwrap(),
            SuggestionStatus::Pending
        );
        assert!(SuggestionStatus::from_str("maybe").is_err());
    }

    #[test]
    fn test_insufficient_forecast() {
        let f = ForecastResult::insufficient("not enough");
        assert!(f.is_insufficient());
        assert_eq!(f.trend, Trend::Stable);
        assert_eq!(f.predicted_amount, 0.0);
    }
}
