//! Feature engineering over a user's expense history
//!
//! Raw expense records are grouped into calendar months (an ordered map keyed
//! by `(year, month)`) and turned into one [`MonthlyFeatureRow`] per month.
//! The forecaster, explainer and anomaly detector all read from these rows.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;

use crate::config::{FeatureConfig, GapPolicy};
use crate::models::ExpenseRecord;

/// Calendar month key: (year, month 1-12)
pub type MonthKey = (i32, u32);

/// Number of values in [`MonthlyFeatureRow::feature_vector`]
pub const FEATURE_COUNT: usize = 5;

/// Aggregated features for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyFeatureRow {
    pub year: i32,
    pub month: u32,
    /// 0-based position in the series
    pub month_index: usize,
    pub total_spend: f64,
    /// Distinct categories with spending this month
    pub category_count: usize,
    /// Delta from the previous row (0 for the first row)
    pub spend_change: f64,
    /// Percent change from the previous row (0 when the previous spend is 0)
    pub spend_pct_change: f64,
    /// Sample standard deviation of total_spend over the trailing window
    pub volatility: f64,
    /// Mean of the per-weekday average amounts across the whole history
    pub avg_weekday_spend: f64,
    pub transaction_count: usize,
}

impl MonthlyFeatureRow {
    /// `[month_index, total_spend, spend_change, volatility, transaction_count]`
    pub fn feature_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.month_index as f64,
            self.total_spend,
            self.spend_change,
            self.volatility,
            self.transaction_count as f64,
        ]
    }

    pub fn key(&self) -> MonthKey {
        (self.year, self.month)
    }
}

/// Spending for one category in one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryMonthlyRow {
    pub year: i32,
    pub month: u32,
    pub category: String,
    pub spend: f64,
}

/// Monthly rows plus the category breakdown, computed once per request
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    pub monthly: Vec<MonthlyFeatureRow>,
    pub category_monthly: Vec<CategoryMonthlyRow>,
}

impl FeatureSet {
    pub fn build(history: &[ExpenseRecord], config: &FeatureConfig) -> Self {
        Self {
            monthly: engineer_features(history, config),
            category_monthly: category_monthly(history),
        }
    }

    pub fn has_monthly(&self) -> bool {
        !self.monthly.is_empty()
    }
}

#[derive(Debug, Default)]
struct MonthGroup {
    total: f64,
    count: usize,
    categories: BTreeSet<String>,
}

pub fn month_key(date: &NaiveDateTime) -> MonthKey {
    (date.year(), date.month())
}

fn next_month((year, month): MonthKey) -> MonthKey {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn group_by_month(history: &[ExpenseRecord], policy: GapPolicy) -> BTreeMap<MonthKey, MonthGroup> {
    let mut groups: BTreeMap<MonthKey, MonthGroup> = BTreeMap::new();

    for record in history {
        let group = groups.entry(month_key(&record.date)).or_default();
        group.total += record.amount;
        group.count += 1;
        group.categories.insert(record.category.clone());
    }

    if policy == GapPolicy::ZeroFill {
        let bounds = groups
            .keys()
            .next()
            .copied()
            .zip(groups.keys().next_back().copied());
        if let Some((first, last)) = bounds {
            let mut key = first;
            while key < last {
                groups.entry(key).or_default();
                key = next_month(key);
            }
        }
    }

    groups
}

/// Monthly spend totals in calendar order
pub fn monthly_totals(history: &[ExpenseRecord], policy: GapPolicy) -> Vec<f64> {
    group_by_month(history, policy)
        .values()
        .map(|g| g.total)
        .collect()
}

/// Spending grouped by (month, category), ordered by month then category
pub fn category_monthly(history: &[ExpenseRecord]) -> Vec<CategoryMonthlyRow> {
    let mut grouped: BTreeMap<(MonthKey, &str), f64> = BTreeMap::new();
    for record in history {
        *grouped
            .entry((month_key(&record.date), record.category.as_str()))
            .or_insert(0.0) += record.amount;
    }

    grouped
        .into_iter()
        .map(|(((year, month), category), spend)| CategoryMonthlyRow {
            year,
            month,
            category: category.to_string(),
            spend,
        })
        .collect()
}

/// Per-category monthly spend series, in order of first appearance
pub fn category_series(rows: &[CategoryMonthlyRow]) -> Vec<(String, Vec<f64>)> {
    let mut series: Vec<(String, Vec<f64>)> = Vec::new();
    for row in rows {
        match series.iter_mut().find(|(c, _)| *c == row.category) {
            Some((_, values)) => values.push(row.spend),
            None => series.push((row.category.clone(), vec![row.spend])),
        }
    }
    series
}

/// Mean amount per day-of-week, averaged across the weekdays present
pub fn avg_weekday_spend(history: &[ExpenseRecord]) -> f64 {
    let mut per_day: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for record in history {
        let entry = per_day
            .entry(record.date.weekday().num_days_from_monday())
            .or_insert((0.0, 0));
        entry.0 += record.amount;
        entry.1 += 1;
    }

    let means: Vec<f64> = per_day
        .values()
        .map(|(sum, count)| sum / *count as f64)
        .collect();
    mean(&means)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Sample standard deviation (n - 1); 0 for fewer than two values
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Build the monthly feature series
///
/// Returns an empty series when the history has fewer than
/// `config.min_records` records.
pub fn engineer_features(
    history: &[ExpenseRecord],
    config: &FeatureConfig,
) -> Vec<MonthlyFeatureRow> {
    if history.len() < config.min_records {
        return Vec::new();
    }

    let groups = group_by_month(history, config.gap_policy);
    let weekday_avg = avg_weekday_spend(history);

    // With fewer rows than the window, every row carries the overall std
    let short_series = groups.len() < config.volatility_window;
    let overall_std = if short_series {
        sample_std(&groups.values().map(|g| g.total).collect::<Vec<_>>())
    } else {
        0.0
    };

    let mut window: VecDeque<f64> = VecDeque::with_capacity(config.volatility_window);
    let mut rows: Vec<MonthlyFeatureRow> = Vec::with_capacity(groups.len());
    let mut previous: Option<f64> = None;

    for (month_index, ((year, month), group)) in groups.into_iter().enumerate() {
        let (spend_change, spend_pct_change) = match previous {
            Some(prev) => {
                let change = group.total - prev;
                let pct = if prev != 0.0 {
                    change / prev * 100.0
                } else {
                    0.0
                };
                (change, pct)
            }
            None => (0.0, 0.0),
        };

        if window.len() == config.volatility_window {
            window.pop_front();
        }
        window.push_back(group.total);

        let volatility = if short_series {
            overall_std
        } else {
            sample_std(window.make_contiguous())
        };

        rows.push(MonthlyFeatureRow {
            year,
            month,
            month_index,
            total_spend: group.total,
            category_count: group.categories.len(),
            spend_change,
            spend_pct_change,
            volatility,
            avg_weekday_spend: weekday_avg,
            transaction_count: group.count,
        });
        previous = Some(group.total);
    }

    rows
}
