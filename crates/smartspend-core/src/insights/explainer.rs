//! Plain-language reasons behind the forecast

use chrono::{Datelike, Weekday};

use super::features::{mean, MonthlyFeatureRow};
use crate::config::NarrativeConfig;
use crate::models::ExpenseRecord;

pub const INSUFFICIENT_HISTORY_REASON: &str = "Insufficient historical data for detailed analysis.";
pub const FALLBACK_REASON: &str = "Analysis based on historical spending patterns and trends";

/// Explain the spending picture; never returns an empty list
pub fn explain_spending(
    rows: &[MonthlyFeatureRow],
    history: &[ExpenseRecord],
    config: &NarrativeConfig,
) -> Vec<String> {
    if rows.len() < 2 {
        return vec![INSUFFICIENT_HISTORY_REASON.to_string()];
    }

    let mut reasons = Vec::new();
    reasons.extend(trend_reason(rows));
    reasons.extend(weekend_reason(history, config.weekend_gap_pct));
    reasons.extend(volatility_reason(rows, config.volatility_ratio));
    reasons.extend(dominant_category_reason(history, config.dominant_category_pct));

    if reasons.is_empty() {
        reasons.push(FALLBACK_REASON.to_string());
    }
    reasons
}

fn trend_reason(rows: &[MonthlyFeatureRow]) -> Option<String> {
    if rows.len() < 3 {
        return None;
    }
    let changes: Vec<f64> = rows[rows.len() - 3..]
        .iter()
        .map(|r| r.spend_change)
        .collect();
    let avg_change = mean(&changes);

    if avg_change > 0.0 {
        let increasing = changes.iter().filter(|c| **c > 0.0).count();
        (increasing >= 2)
            .then(|| format!("Spending has increased for {} consecutive months", increasing))
    } else if avg_change < 0.0 {
        Some("Spending trend is decreasing".to_string())
    } else {
        Some("Spending trend is stable".to_string())
    }
}

fn weekend_reason(history: &[ExpenseRecord], gap_pct: f64) -> Option<String> {
    let (weekend, weekday): (Vec<f64>, Vec<f64>) = {
        let (we, wd): (Vec<&ExpenseRecord>, Vec<&ExpenseRecord>) = history
            .iter()
            .partition(|r| matches!(r.date.weekday(), Weekday::Sat | Weekday::Sun));
        (
            we.iter().map(|r| r.amount).collect(),
            wd.iter().map(|r| r.amount).collect(),
        )
    };

    let weekend_avg = mean(&weekend);
    let weekday_avg = mean(&weekday);
    if weekend_avg <= 0.0 || weekday_avg <= 0.0 {
        return None;
    }

    let pct_diff = (weekend_avg - weekday_avg) / weekday_avg * 100.0;
    if pct_diff.abs() <= gap_pct {
        return None;
    }
    Some(if pct_diff > 0.0 {
        format!("Weekend expenses are {:.0}% higher than weekdays", pct_diff)
    } else {
        format!("Weekday expenses are {:.0}% higher than weekends", pct_diff.abs())
    })
}

fn volatility_reason(rows: &[MonthlyFeatureRow], ratio: f64) -> Option<String> {
    if rows.len() < 3 {
        return None;
    }
    let latest = rows.last()?.volatility;
    let avg_spend = mean(&rows.iter().map(|r| r.total_spend).collect::<Vec<_>>());
    (latest > avg_spend * ratio).then(|| {
        "High spending volatility detected - expenses vary significantly month-to-month"
            .to_string()
    })
}

fn dominant_category_reason(history: &[ExpenseRecord], share_pct: f64) -> Option<String> {
    // Totals in order of first appearance; ties go to the earliest category
    let mut totals: Vec<(&str, f64)> = Vec::new();
    for record in history {
        match totals.iter_mut().find(|(c, _)| *c == record.category) {
            Some((_, total)) => *total += record.amount,
            None => totals.push((&record.category, record.amount)),
        }
    }

    let overall: f64 = totals.iter().map(|(_, t)| t).sum();
    if overall <= 0.0 {
        return None;
    }

    let (category, top) = totals
        .iter()
        .fold(None::<(&str, f64)>, |best, &(c, t)| match best {
            Some((_, bt)) if bt >= t => best,
            _ => Some((c, t)),
        })?;

    let pct = top / overall * 100.0;
    (pct > share_pct).then(|| format!("{} accounts for {:.0}% of total spending", category, pct))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureConfig;
    use crate::insights::features::engineer_features;
    use chrono::NaiveDate;

    fn record(y: i32, m: u32, d: u32, amount: f64, category: &str) -> ExpenseRecord {
        ExpenseRecord::new(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            amount,
            category,
        )
    }

    fn explain(history: &[ExpenseRecord]) -> Vec<String> {
        let rows = engineer_features(history, &FeatureConfig::default());
        explain_spending(&rows, history, &NarrativeConfig::default())
    }

    #[test]
    fn test_insufficient_history() {
        // One month only
        let history = vec![
            record(2024, 1, 1, 10.0, "Food"),
            record(2024, 1, 2, 10.0, "Food"),
            record(2024, 1, 3, 10.0, "Food"),
        ];
        assert_eq!(explain(&history), vec![INSUFFICIENT_HISTORY_REASON]);
    }

    #[test]
    fn test_increase_streak_and_dominant_category() {
        // Mondays only, one category: 100, 200, 300
        let history = vec![
            record(2024, 1, 1, 100.0, "Food"),
            record(2024, 2, 5, 200.0, "Food"),
            record(2024, 3, 4, 300.0, "Food"),
        ];
        let reasons = explain(&history);
        assert!(reasons.contains(&"Spending has increased for 2 consecutive months".to_string()));
        assert!(reasons.contains(&"Food accounts for 100% of total spending".to_string()));
    }

    #[test]
    fn test_decreasing_trend() {
        let history = vec![
            record(2024, 1, 1, 300.0, "Food"),
            record(2024, 2, 5, 200.0, "Rent"),
            record(2024, 3, 4, 290.0, "Fun"),
        ];
        let reasons = explain(&history);
        assert_eq!(reasons[0], "Spending trend is decreasing");
    }

    #[test]
    fn test_weekend_gap() {
        // 2024-01-06 is a Saturday, 2024-01-08 a Monday
        let history = vec![
            record(2024, 1, 6, 150.0, "A"),
            record(2024, 1, 8, 100.0, "B"),
            record(2024, 2, 5, 100.0, "C"),
        ];
        let reasons = explain(&history);
        assert!(reasons.contains(&"Weekend expenses are 50% higher than weekdays".to_string()));

        let history = vec![
            record(2024, 1, 6, 50.0, "A"),
            record(2024, 1, 8, 100.0, "B"),
            record(2024, 2, 5, 100.0, "C"),
        ];
        let reasons = explain(&history);
        assert!(reasons.contains(&"Weekday expenses are 50% higher than weekends".to_string()));
    }

    #[test]
    fn test_high_volatility() {
        let history = vec![
            record(2024, 1, 1, 100.0, "A"),
            record(2024, 2, 5, 1000.0, "B"),
            record(2024, 3, 4, 100.0, "C"),
            record(2024, 3, 5, 0.0, "D"),
        ];
        let reasons = explain(&history);
        assert!(reasons
            .iter()
            .any(|r| r.starts_with("High spending volatility detected")));
    }

    #[test]
    fn test_fallback_reason() {
        // Two months: no trend or volatility reason, even spread, no weekends
        let history = vec![
            record(2024, 1, 1, 100.0, "A"),
            record(2024, 1, 2, 100.0, "B"),
            record(2024, 2, 5, 100.0, "C"),
        ];
        assert_eq!(explain(&history), vec![FALLBACK_REASON]);
    }
}
