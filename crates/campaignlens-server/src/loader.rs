//! Picks the record source for a request and falls back to the local store
//! when the live feed cannot deliver.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use campaignlens_core::record::MetricRecord;
use campaignlens_core::source::{DataSource, FeedStatus, LiveFeed, RecordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerKind {
    Info,
    Success,
    Warning,
    Error,
}

/// Connection status line shown above the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusBanner {
    pub kind: BannerKind,
    pub message: String,
}

impl StatusBanner {
    fn new(kind: BannerKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// The unified row set for one data source, plus how it was obtained.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Arc<Vec<MetricRecord>>,
    pub requested: DataSource,
    /// Where the rows actually came from (differs from `requested` after fallback).
    pub served_from: DataSource,
    pub status: StatusBanner,
    /// Rows dropped by the adapter because they failed validation.
    pub rejected: usize,
    pub loaded_at: DateTime<Utc>,
}

/// Load rows for `requested`.
///
/// Live: a non-empty feed result is used as is. Anything else (not
/// configured, transport error, empty answer) is reported in the banner and
/// the local store is read instead. A store failure yields an empty set with
/// an error banner rather than an error.
pub async fn load_dataset(
    store: &dyn RecordStore,
    live_feed: Option<&dyn LiveFeed>,
    requested: DataSource,
) -> Dataset {
    let mut banner: Option<StatusBanner> = None;

    if requested == DataSource::Live {
        match live_feed {
            None => {
                banner = Some(StatusBanner::new(
                    BannerKind::Warning,
                    "Live analytics API is not configured",
                ));
            }
            Some(feed) => {
                let outcome = feed.fetch().await;
                if outcome.status == FeedStatus::Ok {
                    info!(rows = outcome.records.len(), "Serving live analytics data");
                    return Dataset {
                        records: Arc::new(outcome.records),
                        requested,
                        served_from: DataSource::Live,
                        status: StatusBanner::new(
                            BannerKind::Success,
                            "Connected to live analytics API",
                        ),
                        rejected: outcome.rejected,
                        loaded_at: Utc::now(),
                    };
                }
                let detail = outcome
                    .detail
                    .unwrap_or_else(|| "no data returned".to_string());
                banner = Some(StatusBanner::new(
                    BannerKind::Error,
                    format!("API error: {detail}"),
                ));
            }
        }
    }

    let (records, rejected, status) = match store.load_records().await {
        Ok(loaded) => {
            let status = match banner {
                Some(b) => StatusBanner::new(
                    b.kind,
                    format!("{} | Switched to local database fallback", b.message),
                ),
                None => StatusBanner::new(BannerKind::Info, "Using local database (DuckDB)"),
            };
            (loaded.records, loaded.rejected, status)
        }
        Err(e) => {
            error!(error = %e, "Could not read channel_metrics from DuckDB");
            let mut message = format!("Could not read from local database: {e}");
            if let Some(b) = banner {
                message = format!("{} | {message}", b.message);
            }
            (Vec::new(), 0, StatusBanner::new(BannerKind::Error, message))
        }
    };

    Dataset {
        records: Arc::new(records),
        requested,
        served_from: DataSource::Local,
        status,
        rejected,
        loaded_at: Utc::now(),
    }
}
