//! Spike and rapid-growth detection
//!
//! Output order: the overall spike, then category spikes in order of first
//! appearance, then rapid growth.

use super::features::{category_monthly, category_series, monthly_totals, CategoryMonthlyRow};
use crate::config::{AnomalyConfig, GapPolicy};
use crate::models::{AnomalyInsight, AnomalyKind, ExpenseRecord, Severity};

pub const OVERALL_CATEGORY: &str = "Overall";

/// Detect spending anomalies in a user's history
///
/// Empty when the history has fewer than `config.min_records` records.
pub fn detect_anomalies(
    history: &[ExpenseRecord],
    policy: GapPolicy,
    config: &AnomalyConfig,
) -> Vec<AnomalyInsight> {
    if history.len() < config.min_records {
        return Vec::new();
    }
    detect_in_series(
        &monthly_totals(history, policy),
        &category_monthly(history),
        config,
    )
}

/// Detect anomalies from precomputed monthly totals and category rows
pub fn detect_in_series(
    totals: &[f64],
    category_rows: &[CategoryMonthlyRow],
    config: &AnomalyConfig,
) -> Vec<AnomalyInsight> {
    let mut insights = Vec::new();

    if let [.., previous, latest] = totals {
        if let Some(pct) = spike_pct(*previous, *latest, config.overall_spike_ratio) {
            insights.push(spike(
                OVERALL_CATEGORY,
                format!(
                    "Overall spending increased by {:.0}% compared to last month.",
                    pct
                ),
                pct,
                config,
            ));
        }

        for (category, spends) in category_series(category_rows) {
            let [.., prev_cat, recent_cat] = spends.as_slice() else {
                continue;
            };
            if let Some(pct) = spike_pct(*prev_cat, *recent_cat, config.category_spike_ratio) {
                let message = format!(
                    "{} spending increased by {:.0}% compared to last month.",
                    category, pct
                );
                insights.push(spike(&category, message, pct, config));
            }
        }
    }

    if let &[base, _, latest] = &totals[totals.len().saturating_sub(3)..] {
        if base > 0.0 {
            let growth = latest / base - 1.0;
            if growth > config.rapid_growth_threshold {
                insights.push(AnomalyInsight {
                    kind: AnomalyKind::RapidGrowth,
                    category: OVERALL_CATEGORY.to_string(),
                    message: format!(
                        "Spending has grown by {:.0}% over the last 3 months.",
                        growth * 100.0
                    ),
                    severity: Severity::High,
                });
            }
        }
    }

    insights
}

/// Percent increase when `latest` exceeds `previous * ratio`; a zero base never spikes
fn spike_pct(previous: f64, latest: f64, ratio: f64) -> Option<f64> {
    if previous > 0.0 && latest > previous * ratio {
        Some((latest - previous) / previous * 100.0)
    } else {
        None
    }
}

fn spike(category: &str, message: String, pct: f64, config: &AnomalyConfig) -> AnomalyInsight {
    AnomalyInsight {
        kind: AnomalyKind::Spike,
        category: category.to_string(),
        message,
        severity: if pct > config.high_severity_pct {
            Severity::High
        } else {
            Severity::Medium
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(month: u32, day: u32, amount: f64, category: &str) -> ExpenseRecord {
        ExpenseRecord::new(
            NaiveDate::from_ymd_opt(2024, month, day)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            amount,
            category,
        )
    }

    /// Two months split across two categories so no single category spikes
    fn two_months(first: f64, second: f64) -> Vec<ExpenseRecord> {
        vec![
            record(1, 5, first / 2.0, "Food"),
            record(1, 6, first / 2.0, "Rent"),
            record(2, 5, second - first / 2.0, "Food"),
            record(2, 6, first / 2.0, "Rent"),
        ]
    }

    fn overall(insights: &[AnomalyInsight]) -> Vec<&AnomalyInsight> {
        insights
            .iter()
            .filter(|i| i.kind == AnomalyKind::Spike && i.category == OVERALL_CATEGORY)
            .collect()
    }

    fn detect(history: &[ExpenseRecord]) -> Vec<AnomalyInsight> {
        detect_anomalies(history, GapPolicy::Skip, &AnomalyConfig::default())
    }

    #[test]
    fn test_too_few_records() {
        let history = vec![record(1, 1, 10.0, "Food"), record(2, 1, 100.0, "Food")];
        assert!(detect(&history).is_empty());
    }

    #[test]
    fn test_overall_spike_high() {
        let insights = detect(&two_months(1000.0, 1600.0));
        let spikes = overall(&insights);
        assert_eq!(spikes.len(), 1);
        assert_eq!(spikes[0].severity, Severity::High);
        assert_eq!(
            spikes[0].message,
            "Overall spending increased by 60% compared to last month."
        );
    }

    #[test]
    fn test_overall_spike_medium() {
        let insights = detect(&two_months(1000.0, 1450.0));
        let spikes = overall(&insights);
        assert_eq!(spikes.len(), 1);
        assert_eq!(spikes[0].severity, Severity::Medium);
    }

    #[test]
    fn test_overall_spike_boundaries() {
        // Exactly +50% is not above the HIGH cutoff
        let insights = detect(&two_months(1000.0, 1500.0));
        let spikes = overall(&insights);
        assert_eq!(spikes.len(), 1);
        assert_eq!(spikes[0].severity, Severity::Medium);
        assert_eq!(
            spikes[0].message,
            "Overall spending increased by 50% compared to last month."
        );

        // Exactly +40% does not clear the spike ratio
        let insights = detect(&two_months(1000.0, 1400.0));
        assert!(overall(&insights).is_empty());
    }

    #[test]
    fn test_no_overall_spike_for_small_increase() {
        let insights = detect(&two_months(1000.0, 1100.0));
        assert!(overall(&insights).is_empty());
    }

    #[test]
    fn test_category_spike_severity() {
        // Food 1000 -> 1450 (+45%), total 1500 -> 1950 (+30%)
        let medium = vec![
            record(1, 5, 1000.0, "Food"),
            record(1, 6, 500.0, "Rent"),
            record(2, 5, 1450.0, "Food"),
            record(2, 6, 500.0, "Rent"),
        ];
        let insights = detect(&medium);
        assert!(overall(&insights).is_empty());
        let food: Vec<_> = insights.iter().filter(|i| i.category == "Food").collect();
        assert_eq!(food.len(), 1);
        assert_eq!(food[0].severity, Severity::Medium);
        assert_eq!(
            food[0].message,
            "Food spending increased by 45% compared to last month."
        );

        // Food 1000 -> 1550 (+55%)
        let high = vec![
            record(1, 5, 1000.0, "Food"),
            record(1, 6, 500.0, "Rent"),
            record(2, 5, 1550.0, "Food"),
            record(2, 6, 500.0, "Rent"),
        ];
        let insights = detect(&high);
        let food: Vec<_> = insights.iter().filter(|i| i.category == "Food").collect();
        assert_eq!(food[0].severity, Severity::High);
    }

    #[test]
    fn test_rapid_growth_uses_third_from_last_month() {
        // 1000 -> 1200 -> 1350: +35% over the window, no single-month spike
        let history = vec![
            record(1, 5, 1000.0, "Food"),
            record(2, 5, 1200.0, "Food"),
            record(3, 5, 1350.0, "Food"),
            record(3, 6, 0.0, "Food"),
        ];
        let insights = detect(&history);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, AnomalyKind::RapidGrowth);
        assert_eq!(insights[0].severity, Severity::High);
        assert_eq!(
            insights[0].message,
            "Spending has grown by 35% over the last 3 months."
        );
    }

    #[test]
    fn test_output_order() {
        // Overall +100%, Food +100%, growth over three months
        let history = vec![
            record(1, 5, 500.0, "Food"),
            record(2, 5, 500.0, "Food"),
            record(3, 5, 1000.0, "Food"),
            record(3, 6, 0.0, "Food"),
        ];
        let kinds: Vec<_> = detect(&history)
            .iter()
            .map(|i| (i.kind, i.category.clone()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (AnomalyKind::Spike, "Overall".to_string()),
                (AnomalyKind::Spike, "Food".to_string()),
                (AnomalyKind::RapidGrowth, "Overall".to_string()),
            ]
        );
    }

    #[test]
    fn test_zero_base_never_spikes() {
        let history = vec![
            record(1, 5, 0.0, "Food"),
            record(1, 6, 0.0, "Food"),
            record(2, 5, 500.0, "Food"),
            record(2, 6, 500.0, "Food"),
        ];
        assert!(detect(&history).is_empty());
    }

    #[test]
    fn test_zero_fill_gap_blocks_spike() {
        // Jan 1000, (Feb empty), Mar 2000: with zero-fill the prior month is 0
        let history = vec![
            record(1, 5, 500.0, "Rent"),
            record(1, 6, 500.0, "Food"),
            record(3, 5, 1000.0, "Rent"),
            record(3, 6, 1000.0, "Food"),
        ];
        let skip = detect_anomalies(&history, GapPolicy::Skip, &AnomalyConfig::default());
        assert_eq!(overall(&skip).len(), 1);

        let filled = detect_anomalies(&history, GapPolicy::ZeroFill, &AnomalyConfig::default());
        assert!(overall(&filled).is_empty());
    }
}
