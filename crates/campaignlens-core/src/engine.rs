//! Filtering, grouping and KPI summaries over validated [`MetricRecord`]s.
//!
//! Every function here is pure: inputs are borrowed, nothing is cached, and
//! empty input always produces an empty or zero result.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::record::MetricRecord;

/// Value reported for a mean over zero records.
pub const EMPTY_MEAN: f64 = 0.0;

/// Inclusive date range plus allow-lists for channel and campaign.
///
/// An empty allow-list excludes everything. Use [`FilterCriteria::all_of`]
/// for "no filter".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub channels: BTreeSet<String>,
    pub campaigns: BTreeSet<String>,
}

impl FilterCriteria {
    /// Criteria that keep every record in `records`.
    ///
    /// For empty input the range is inverted (`MAX..MIN`) so it matches
    /// nothing, which is also what filtering an empty set returns.
    pub fn all_of(records: &[MetricRecord]) -> Self {
        let (start, end) = date_bounds(records).unwrap_or((NaiveDate::MAX, NaiveDate::MIN));
        Self {
            start,
            end,
            channels: records.iter().map(|r| r.channel.clone()).collect(),
            campaigns: records.iter().map(|r| r.campaign.clone()).collect(),
        }
    }

    pub fn matches(&self, record: &MetricRecord) -> bool {
        self.start <= record.date
            && record.date <= self.end
            && self.channels.contains(&record.channel)
            && self.campaigns.contains(&record.campaign)
    }
}

/// Earliest and latest record date, or `None` for empty input.
pub fn date_bounds(records: &[MetricRecord]) -> Option<(NaiveDate, NaiveDate)> {
    let min = records.iter().map(|r| r.date).min()?;
    let max = records.iter().map(|r| r.date).max()?;
    Some((min, max))
}

/// Distinct values of a label dimension in first-seen order, for filter
/// pickers.
pub fn distinct_values(records: &[MetricRecord], dimension: Dimension) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|r| dimension_key(dimension, r))
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

/// Records matching `criteria`, in input order.
///
/// An inverted range (`start > end`) is not an error; it just matches nothing.
pub fn filter(records: &[MetricRecord], criteria: &FilterCriteria) -> Vec<MetricRecord> {
    if criteria.start > criteria.end {
        return Vec::new();
    }
    records
        .iter()
        .filter(|r| criteria.matches(r))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Date,
    Channel,
    Campaign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Sessions,
    Conversions,
    BounceRate,
    EngagementOrCtr,
    Cost,
}

impl Metric {
    pub fn value(self, record: &MetricRecord) -> f64 {
        match self {
            Metric::Sessions => record.sessions as f64,
            Metric::Conversions => record.conversions,
            Metric::BounceRate => record.bounce_rate,
            Metric::EngagementOrCtr => record.engagement_or_ctr,
            Metric::Cost => record.cost,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    Sum,
    Mean,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: String,
    pub value: f64,
    /// Number of records folded into this row; always at least 1.
    pub count: usize,
}

/// One chart's worth of grouped data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateView {
    pub dimension: Dimension,
    pub metric: Metric,
    pub reducer: Reducer,
    pub rows: Vec<AggregateRow>,
}

impl AggregateView {
    /// Sum of all row values (meaningful for [`Reducer::Sum`] views).
    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.value).sum()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.rows.iter().find(|r| r.key == key).map(|r| r.value)
    }
}

fn dimension_key(dimension: Dimension, record: &MetricRecord) -> String {
    match dimension {
        Dimension::Date => record.date.format("%Y-%m-%d").to_string(),
        Dimension::Channel => record.channel.clone(),
        Dimension::Campaign => record.campaign.clone(),
    }
}

/// Partition `records` by `dimension` and reduce `metric` per partition.
///
/// Keys come out in first-seen order, except date keys which are sorted
/// chronologically. Only non-empty partitions produce a row.
pub fn group_by(
    records: &[MetricRecord],
    dimension: Dimension,
    metric: Metric,
    reducer: Reducer,
) -> AggregateView {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut sums: Vec<(String, f64, usize)> = Vec::new();

    for record in records {
        let key = dimension_key(dimension, record);
        let value = metric.value(record);
        match index.get(&key) {
            Some(&i) => {
                sums[i].1 += value;
                sums[i].2 += 1;
            }
            None => {
                index.insert(key.clone(), sums.len());
                sums.push((key, value, 1));
            }
        }
    }

    // ISO dates sort lexicographically in calendar order.
    if dimension == Dimension::Date {
        sums.sort_by(|a, b| a.0.cmp(&b.0));
    }

    let rows = sums
        .into_iter()
        .map(|(key, sum, count)| AggregateRow {
            key,
            value: match reducer {
                Reducer::Sum => sum,
                Reducer::Mean => sum / count as f64,
            },
            count,
        })
        .collect();

    AggregateView {
        dimension,
        metric,
        reducer,
        rows,
    }
}

/// Scorecard totals and averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total_sessions: u64,
    pub total_conversions: f64,
    /// [`EMPTY_MEAN`] when there are no records.
    pub avg_bounce_rate: f64,
    pub total_cost: f64,
    /// [`EMPTY_MEAN`] when there are no records.
    pub avg_engagement_or_ctr: f64,
    pub record_count: usize,
}

pub fn summarize(records: &[MetricRecord]) -> KpiSummary {
    let n = records.len();
    let mean = |metric: Metric| {
        if n == 0 {
            EMPTY_MEAN
        } else {
            records.iter().map(|r| metric.value(r)).sum::<f64>() / n as f64
        }
    };

    KpiSummary {
        total_sessions: records.iter().map(|r| r.sessions).sum(),
        total_conversions: records.iter().map(|r| r.conversions).sum(),
        avg_bounce_rate: mean(Metric::BounceRate),
        total_cost: records.iter().map(|r| r.cost).sum(),
        avg_engagement_or_ctr: mean(Metric::EngagementOrCtr),
        record_count: n,
    }
}

/// A single day's session total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub sessions: i64,
}

/// Sessions summed per calendar day, oldest first. This is the shape the
/// forecast expects: one point per date, no duplicates.
pub fn daily_sessions(records: &[MetricRecord]) -> Vec<SeriesPoint> {
    let mut by_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for record in records {
        *by_day.entry(record.date).or_default() += record.sessions as i64;
    }
    by_day
        .into_iter()
        .map(|(date, sessions)| SeriesPoint { date, sessions })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn rec(d: u32, channel: &str, campaign: &str, sessions: u64, conversions: f64) -> MetricRecord {
        MetricRecord {
            date: day(d),
            channel: channel.to_string(),
            campaign: campaign.to_string(),
            sessions,
            conversions,
            bounce_rate: 40.0 + d as f64,
            engagement_or_ctr: if channel == "Paid Ads" { 2.5 } else { 0.0 },
            cost: if channel == "Paid Ads" { 100.0 } else { 0.0 },
        }
    }

    fn sample() -> Vec<MetricRecord> {
        vec![
            rec(3, "Paid Ads", "Winter_Sale", 900, 30.0),
            rec(1, "Email", "Newsletter_Weekly", 100, 5.0),
            rec(2, "Organic Search", "None", 400, 12.0),
            rec(1, "Paid Ads", "Retargeting_Q1", 250, 9.0),
            rec(2, "Email", "Newsletter_Weekly", 150, 4.0),
        ]
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn inverted_range_is_empty() {
        let records = sample();
        let mut criteria = FilterCriteria::all_of(&records);
        std::mem::swap(&mut criteria.start, &mut criteria.end);
        assert!(filter(&records, &criteria).is_empty());
    }

    #[test]
    fn full_criteria_returns_input_in_order() {
        let records = sample();
        let criteria = FilterCriteria::all_of(&records);
        assert_eq!(filter(&records, &criteria), records);
    }

    #[test]
    fn channel_filter_keeps_only_email() {
        let records = vec![
            rec(1, "Email", "None", 100, 5.0),
            rec(2, "Ads", "None", 200, 20.0),
        ];
        let criteria = FilterCriteria {
            start: day(1),
            end: day(2),
            channels: set(&["Email"]),
            campaigns: set(&["None"]),
        };
        assert_eq!(filter(&records, &criteria), vec![records[0].clone()]);
    }

    #[test]
    fn empty_allow_list_excludes_everything() {
        let records = sample();
        let mut criteria = FilterCriteria::all_of(&records);
        criteria.campaigns.clear();
        assert!(filter(&records, &criteria).is_empty());
    }

    #[test]
    fn date_range_is_inclusive() {
        let records = sample();
        let mut criteria = FilterCriteria::all_of(&records);
        criteria.start = day(2);
        criteria.end = day(2);
        let out = filter(&records, &criteria);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.date == day(2)));
    }

    #[test]
    fn all_of_empty_matches_nothing() {
        let criteria = FilterCriteria::all_of(&[]);
        assert!(criteria.start > criteria.end);
        assert!(filter(&[], &criteria).is_empty());
    }

    #[test]
    fn distinct_values_keep_first_seen_order() {
        assert_eq!(
            distinct_values(&sample(), Dimension::Channel),
            ["Paid Ads", "Email", "Organic Search"]
        );
        assert!(distinct_values(&[], Dimension::Campaign).is_empty());
    }

    #[test]
    fn date_grouping_is_chronological() {
        let view = group_by(&sample(), Dimension::Date, Metric::Sessions, Reducer::Sum);
        let keys: Vec<_> = view.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(view.get("2024-01-01"), Some(350.0));
        assert_eq!(view.get("2024-01-02"), Some(550.0));
    }

    #[test]
    fn label_grouping_keeps_first_seen_order() {
        let view = group_by(
            &sample(),
            Dimension::Channel,
            Metric::Conversions,
            Reducer::Sum,
        );
        let keys: Vec<_> = view.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["Paid Ads", "Email", "Organic Search"]);
        assert_eq!(view.get("Paid Ads"), Some(39.0));
        assert_eq!(view.rows[0].count, 2);
    }

    #[test]
    fn mean_reducer_averages_per_partition() {
        let view = group_by(
            &sample(),
            Dimension::Campaign,
            Metric::BounceRate,
            Reducer::Mean,
        );
        // Newsletter_Weekly: days 1 and 2 → 41 and 42.
        assert_eq!(view.get("Newsletter_Weekly"), Some(41.5));
        assert!(view.rows.iter().all(|r| r.count > 0));
    }

    #[test]
    fn grouped_sums_match_summary_totals() {
        let records = sample();
        let summary = summarize(&records);
        for dimension in [Dimension::Date, Dimension::Channel, Dimension::Campaign] {
            let sessions = group_by(&records, dimension, Metric::Sessions, Reducer::Sum);
            assert_eq!(sessions.total(), summary.total_sessions as f64);
            let conversions = group_by(&records, dimension, Metric::Conversions, Reducer::Sum);
            assert_eq!(conversions.total(), summary.total_conversions);
            let cost = group_by(&records, dimension, Metric::Cost, Reducer::Sum);
            assert_eq!(cost.total(), summary.total_cost);
        }
    }

    #[test]
    fn grouping_empty_input_yields_no_rows() {
        let view = group_by(&[], Dimension::Channel, Metric::BounceRate, Reducer::Mean);
        assert!(view.rows.is_empty());
        assert_eq!(view.total(), 0.0);
    }

    #[test]
    fn summarize_empty_uses_sentinels() {
        let s = summarize(&[]);
        assert_eq!(s.total_sessions, 0);
        assert_eq!(s.total_conversions, 0.0);
        assert_eq!(s.total_cost, 0.0);
        assert_eq!(s.avg_bounce_rate, EMPTY_MEAN);
        assert_eq!(s.avg_engagement_or_ctr, EMPTY_MEAN);
        assert_eq!(s.record_count, 0);
        assert!(!s.avg_bounce_rate.is_nan());
    }

    #[test]
    fn summarize_computes_totals_and_means() {
        let s = summarize(&sample());
        assert_eq!(s.total_sessions, 1800);
        assert_eq!(s.total_conversions, 60.0);
        assert_eq!(s.total_cost, 200.0);
        assert_eq!(s.avg_engagement_or_ctr, 1.0);
        assert_eq!(s.record_count, 5);
    }

    #[test]
    fn daily_sessions_collapses_duplicate_days() {
        let series = daily_sessions(&sample());
        assert_eq!(
            series,
            vec![
                SeriesPoint { date: day(1), sessions: 350 },
                SeriesPoint { date: day(2), sessions: 550 },
                SeriesPoint { date: day(3), sessions: 900 },
            ]
        );
        assert!(daily_sessions(&[]).is_empty());
    }
}
