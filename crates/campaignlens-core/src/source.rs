//! Collaborator contracts for the places records come from.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::record::MetricRecord;

/// Which collaborator the dashboard reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    #[default]
    Local,
    Live,
}

impl DataSource {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "local" | "db" | "database" => Some(Self::Local),
            "live" | "api" => Some(Self::Live),
            _ => None,
        }
    }
}

/// Rows read back from a store, with a count of rows that failed validation
/// and were dropped.
#[derive(Debug, Clone, Default)]
pub struct LoadedRecords {
    pub records: Vec<MetricRecord>,
    pub rejected: usize,
}

/// Local persistence for channel-day rows.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    async fn load_records(&self) -> anyhow::Result<LoadedRecords>;

    /// Replace the whole table with `records` in one transaction.
    async fn replace_records(&self, records: &[MetricRecord]) -> anyhow::Result<()>;

    async fn append_records(&self, records: &[MetricRecord]) -> anyhow::Result<()>;

    async fn count_records(&self) -> anyhow::Result<u64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedStatus {
    Ok,
    /// The API answered but returned no rows.
    Empty,
    /// No live feed is configured.
    Unavailable,
    Error,
}

/// Result of one live fetch. `records` is empty unless `status` is `Ok`.
#[derive(Debug, Clone)]
pub struct FeedOutcome {
    pub records: Vec<MetricRecord>,
    pub status: FeedStatus,
    pub detail: Option<String>,
    pub rejected: usize,
}

impl FeedOutcome {
    pub fn ok(records: Vec<MetricRecord>, rejected: usize) -> Self {
        if records.is_empty() {
            if rejected > 0 {
                return Self {
                    rejected,
                    ..Self::failed(
                        FeedStatus::Empty,
                        format!("API returned {rejected} rows, all rejected by validation"),
                    )
                };
            }
            return Self::failed(FeedStatus::Empty, "API returned empty data");
        }
        Self {
            records,
            status: FeedStatus::Ok,
            detail: None,
            rejected,
        }
    }

    pub fn failed(status: FeedStatus, detail: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            status,
            detail: Some(detail.into()),
            rejected: 0,
        }
    }
}

/// Remote analytics service. Implementations never fail the call; transport
/// and decoding problems are reported through [`FeedOutcome::status`].
#[async_trait]
pub trait LiveFeed: Send + Sync + 'static {
    async fn fetch(&self) -> FeedOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_data_source_aliases() {
        assert_eq!(DataSource::parse("Local"), Some(DataSource::Local));
        assert_eq!(DataSource::parse(" live "), Some(DataSource::Live));
        assert_eq!(DataSource::parse("api"), Some(DataSource::Live));
        assert_eq!(DataSource::parse("csv"), None);
    }

    #[test]
    fn ok_with_no_rows_is_empty_status() {
        let outcome = FeedOutcome::ok(Vec::new(), 0);
        assert_eq!(outcome.status, FeedStatus::Empty);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.detail.as_deref(), Some("API returned empty data"));
    }

    #[test]
    fn all_rows_rejected_keeps_count_and_says_so() {
        let outcome = FeedOutcome::ok(Vec::new(), 3);
        assert_eq!(outcome.status, FeedStatus::Empty);
        assert_eq!(outcome.rejected, 3);
        assert_eq!(
            outcome.detail.as_deref(),
            Some("API returned 3 rows, all rejected by validation")
        );
    }
}
