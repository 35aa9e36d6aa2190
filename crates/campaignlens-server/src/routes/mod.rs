pub mod dashboard;
pub mod export;
pub mod forecast;
pub mod health;
pub mod import;
pub mod records;
pub mod seed;

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use campaignlens_core::engine::{filter, FilterCriteria};
use campaignlens_core::record::MetricRecord;
use campaignlens_core::source::DataSource;

use crate::{error::AppError, loader::Dataset, state::AppState};

/// Query parameters shared by every read endpoint.
///
/// `channels` and `campaigns` are comma-separated allow-lists. Leaving one out
/// keeps every value; passing it empty (`channels=`) keeps none.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub source: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub channels: Option<String>,
    pub campaigns: Option<String>,
}

/// Echo of the criteria actually applied, for the response payload.
#[derive(Debug, Serialize)]
pub struct AppliedFilters {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub channels: BTreeSet<String>,
    pub campaigns: BTreeSet<String>,
}

/// A loaded dataset narrowed down by a [`FilterQuery`].
pub struct Selection {
    pub dataset: Dataset,
    pub criteria: FilterCriteria,
    pub records: Vec<MetricRecord>,
}

impl Selection {
    pub fn applied(&self) -> AppliedFilters {
        let valid_range = self.criteria.start <= self.criteria.end;
        AppliedFilters {
            start_date: valid_range.then_some(self.criteria.start),
            end_date: valid_range.then_some(self.criteria.end),
            channels: self.criteria.channels.clone(),
            campaigns: self.criteria.campaigns.clone(),
        }
    }
}

impl FilterQuery {
    pub fn source(&self, default: DataSource) -> Result<DataSource, AppError> {
        match self.source.as_deref() {
            None | Some("") => Ok(default),
            Some(raw) => DataSource::parse(raw)
                .ok_or_else(|| AppError::invalid("source", "expected 'local' or 'live'")),
        }
    }

    /// Build criteria over `records`, defaulting every unset bound to "all".
    pub fn criteria(&self, records: &[MetricRecord]) -> Result<FilterCriteria, AppError> {
        let mut criteria = FilterCriteria::all_of(records);
        if let Some(start) = parse_date("start_date", self.start_date.as_deref())? {
            criteria.start = start;
        }
        if let Some(end) = parse_date("end_date", self.end_date.as_deref())? {
            criteria.end = end;
        }
        if let Some(raw) = self.channels.as_deref() {
            criteria.channels = split_list(raw);
        }
        if let Some(raw) = self.campaigns.as_deref() {
            criteria.campaigns = split_list(raw);
        }
        Ok(criteria)
    }
}

fn parse_date(field: &'static str, raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                AppError::invalid(field, format!("invalid {field} format, expected YYYY-MM-DD"))
            }),
    }
}

fn split_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Load the requested source and apply the query's filters.
pub async fn select(state: &AppState, query: &FilterQuery) -> Result<Selection, AppError> {
    let source = query.source(state.config.default_source)?;
    let dataset = state.dataset(source).await;
    let criteria = query.criteria(&dataset.records)?;
    let records = filter(&dataset.records, &criteria);
    Ok(Selection {
        dataset,
        criteria,
        records,
    })
}
