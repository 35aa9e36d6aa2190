use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// Campaign label used when a row is not attributed to any campaign.
pub const NO_CAMPAIGN: &str = "None";

/// One channel-day of marketing metrics.
///
/// Field order here is the column order of the CSV export, and the field
/// names are its header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub date: NaiveDate,
    pub channel: String,
    pub campaign: String,
    pub sessions: u64,
    /// Integer for generated and store rows, may be fractional for live rows.
    pub conversions: f64,
    /// Percentage, 0–100.
    pub bounce_rate: f64,
    /// CTR for paid channels, engagement rate otherwise; 0 when not applicable.
    pub engagement_or_ctr: f64,
    pub cost: f64,
}

impl MetricRecord {
    /// Check the numeric fields of a record built by an adapter.
    ///
    /// `conversions <= sessions` is not checked.
    pub fn validate(&self) -> Result<(), RecordError> {
        check_non_negative("conversions", self.conversions)?;
        check_percentage("bounce_rate", self.bounce_rate)?;
        check_percentage("engagement_or_ctr", self.engagement_or_ctr)?;
        check_non_negative("cost", self.cost)?;
        Ok(())
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), RecordError> {
    if !value.is_finite() {
        return Err(RecordError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(RecordError::Negative { field, value });
    }
    Ok(())
}

fn check_percentage(field: &'static str, value: f64) -> Result<(), RecordError> {
    check_non_negative(field, value)?;
    if value > 100.0 {
        return Err(RecordError::PercentageOutOfRange { field, value });
    }
    Ok(())
}

/// Parse a calendar date as written by the store (`YYYY-MM-DD`) or by the
/// live analytics API (`YYYYMMDD`).
pub fn parse_record_date(raw: &str) -> Result<NaiveDate, RecordError> {
    let trimmed = raw.trim();
    // DuckDB renders DATE casts as plain ISO dates, but tolerate a time suffix
    // from TIMESTAMP columns in imported tables.
    let date_part = trimmed.split([' ', 'T']).next().unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%Y%m%d"))
        .map_err(|_| RecordError::InvalidDate(raw.to_string()))
}
