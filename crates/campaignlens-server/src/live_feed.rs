//! HTTP client for the remote analytics reporting API.
//!
//! Speaks the `reports:batchGet` request/response shape: one report request
//! with date/source/campaign dimensions and four metrics. Authentication is
//! out of scope; an already-issued bearer token can be passed through.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use campaignlens_core::config::LiveFeedConfig;
use campaignlens_core::record::MetricRecord;
use campaignlens_core::schema_map::{resolve_column, Field, RecordBuilder};
use campaignlens_core::source::{FeedOutcome, FeedStatus, LiveFeed};

/// Dimensions requested, in order. Used when the response has no column header.
pub const REQUESTED_DIMENSIONS: [&str; 3] = ["ga:date", "ga:source", "ga:campaign"];

/// Metrics requested, in order. `percentNewSessions` is the engagement proxy.
pub const REQUESTED_METRICS: [&str; 4] = [
    "ga:sessions",
    "ga:transactions",
    "ga:bounceRate",
    "ga:percentNewSessions",
];

#[derive(Debug, Deserialize, Default)]
pub struct BatchGetResponse {
    #[serde(default)]
    pub reports: Vec<Report>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Report {
    #[serde(rename = "columnHeader")]
    pub column_header: Option<ColumnHeader>,
    #[serde(default)]
    pub data: ReportData,
}

#[derive(Debug, Deserialize, Default)]
pub struct ColumnHeader {
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(rename = "metricHeader", default)]
    pub metric_header: MetricHeader,
}

#[derive(Debug, Deserialize, Default)]
pub struct MetricHeader {
    #[serde(rename = "metricHeaderEntries", default)]
    pub entries: Vec<MetricHeaderEntry>,
}

#[derive(Debug, Deserialize)]
pub struct MetricHeaderEntry {
    pub name: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ReportData {
    #[serde(default)]
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Deserialize)]
pub struct ReportRow {
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(default)]
    pub metrics: Vec<DateRangeValues>,
}

#[derive(Debug, Deserialize)]
pub struct DateRangeValues {
    #[serde(default)]
    pub values: Vec<String>,
}

fn columns(names: &[String], fallback: &[&str]) -> Vec<Option<Field>> {
    if names.is_empty() {
        fallback.iter().map(|n| resolve_column(n)).collect()
    } else {
        names.iter().map(|n| resolve_column(n)).collect()
    }
}

/// Convert a decoded response into canonical records.
///
/// Returns the accepted records and the number of rows rejected by
/// validation (bad date, negative counts, rates out of range).
pub fn parse_response(response: BatchGetResponse) -> (Vec<MetricRecord>, usize) {
    let mut records = Vec::new();
    let mut rejected = 0;

    for report in response.reports {
        let (dim_names, metric_names) = match &report.column_header {
            Some(h) => (
                h.dimensions.clone(),
                h.metric_header
                    .entries
                    .iter()
                    .map(|e| e.name.clone())
                    .collect::<Vec<_>>(),
            ),
            None => (Vec::new(), Vec::new()),
        };
        let dim_fields = columns(&dim_names, &REQUESTED_DIMENSIONS);
        let metric_fields = columns(&metric_names, &REQUESTED_METRICS);

        for row in report.data.rows {
            let mut builder = RecordBuilder::new();
            for (field, value) in dim_fields.iter().zip(&row.dimensions) {
                if let Some(field) = field {
                    builder.set(*field, value.as_str());
                }
            }
            // Only the first date range is requested.
            if let Some(first) = row.metrics.first() {
                for (field, value) in metric_fields.iter().zip(&first.values) {
                    if let Some(field) = field {
                        builder.set(*field, value.as_str());
                    }
                }
            }
            match builder.build() {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(error = %e, "Skipping invalid live analytics row");
                    rejected += 1;
                }
            }
        }
    }
    (records, rejected)
}

/// [`LiveFeed`] backed by an HTTP reporting endpoint.
#[derive(Clone)]
pub struct HttpLiveFeed {
    client: Client,
    config: LiveFeedConfig,
}

impl HttpLiveFeed {
    pub fn new(config: LiveFeedConfig) -> Result<Self> {
        reqwest::Url::parse(&config.url).context("Invalid live feed URL")?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("failed to build live feed http client")?;
        Ok(Self { client, config })
    }

    fn request_body(&self) -> Value {
        json!({
            "reportRequests": [{
                "viewId": self.config.view_id,
                "dateRanges": [{
                    "startDate": format!("{}daysAgo", self.config.lookback_days),
                    "endDate": "today"
                }],
                "metrics": REQUESTED_METRICS
                    .iter()
                    .map(|m| json!({ "expression": m }))
                    .collect::<Vec<_>>(),
                "dimensions": REQUESTED_DIMENSIONS
                    .iter()
                    .map(|d| json!({ "name": d }))
                    .collect::<Vec<_>>(),
            }]
        })
    }

    async fn batch_get(&self) -> Result<BatchGetResponse> {
        let mut req = self.client.post(&self.config.url).json(&self.request_body());
        if let Some(token) = &self.config.token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.context("live feed request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("live feed error {status}: {body}");
        }

        resp.json()
            .await
            .context("live feed response parse failed")
    }
}

#[async_trait]
impl LiveFeed for HttpLiveFeed {
    async fn fetch(&self) -> FeedOutcome {
        let response = match self.batch_get().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = ?e, "Live analytics fetch failed");
                return FeedOutcome::failed(FeedStatus::Error, format!("{e:#}"));
            }
        };
        let (records, rejected) = parse_response(response);
        info!(rows = records.len(), rejected, "Fetched live analytics rows");
        FeedOutcome::ok(records, rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn decode(v: Value) -> BatchGetResponse {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn parses_rows_using_column_header() {
        let response = decode(json!({
            "reports": [{
                "columnHeader": {
                    "dimensions": ["ga:source", "ga:date", "ga:campaign"],
                    "metricHeader": { "metricHeaderEntries": [
                        { "name": "ga:bounceRate" },
                        { "name": "ga:sessions" }
                    ]}
                },
                "data": { "rows": [
                    { "dimensions": ["google", "20240110", "(not set)"],
                      "metrics": [{ "values": ["41.5", "820"] }] }
                ]}
            }]
        }));
        let (records, rejected) = parse_response(response);
        assert_eq!(rejected, 0);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert_eq!(r.channel, "google");
        assert_eq!(r.campaign, "None");
        assert_eq!(r.sessions, 820);
        assert_eq!(r.bounce_rate, 41.5);
        assert_eq!(r.cost, 0.0);
    }

    #[test]
    fn falls_back_to_requested_order_without_header() {
        let response = decode(json!({
            "reports": [{
                "data": { "rows": [
                    { "dimensions": ["20240111", "newsletter", "spring"],
                      "metrics": [{ "values": ["300", "12", "55.0", "61.2"] }] },
                    { "dimensions": ["20241345", "newsletter", "spring"],
                      "metrics": [{ "values": ["300", "12", "55.0", "61.2"] }] }
                ]}
            }]
        }));
        let (records, rejected) = parse_response(response);
        assert_eq!(records.len(), 1);
        assert_eq!(rejected, 1);
        assert_eq!(records[0].conversions, 12.0);
        assert_eq!(records[0].engagement_or_ctr, 61.2);
        assert_eq!(records[0].campaign, "spring");
    }

    #[test]
    fn empty_response_has_no_rows() {
        let (records, rejected) = parse_response(decode(json!({})));
        assert!(records.is_empty());
        assert_eq!(rejected, 0);
    }

    #[test]
    fn rejects_bad_url() {
        let cfg = LiveFeedConfig {
            url: "not a url".to_string(),
            token: None,
            view_id: String::new(),
            timeout_secs: 1,
            lookback_days: 30,
        };
        assert!(HttpLiveFeed::new(cfg).is_err());
    }
}
