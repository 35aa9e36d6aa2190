use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::Response,
};
use serde::Deserialize;

use campaignlens_core::record::MetricRecord;

use super::{select, FilterQuery};
use crate::{error::AppError, state::AppState};

/// Maximum number of rows allowed in a single export (500 000).
const MAX_EXPORT_ROWS: usize = 500_000;

pub const EXPORT_FILENAME: &str = "marketing_data_export.csv";

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub format: Option<String>,
}

/// `GET /api/export`: download the filtered rows as CSV.
///
/// The header row is the record field names; values are written as stored.
/// Response: `Content-Type: text/csv` with `Content-Disposition: attachment`.
#[tracing::instrument(skip(state))]
pub async fn export_records(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
    Query(params): Query<ExportParams>,
) -> Result<Response, AppError> {
    // Validate format (only csv supported right now).
    if let Some(ref fmt) = params.format {
        if fmt != "csv" {
            return Err(AppError::invalid(
                "format",
                format!("unsupported format: {fmt}; only 'csv' is supported"),
            ));
        }
    }

    let selection = select(&state, &query).await?;

    if selection.records.len() > MAX_EXPORT_ROWS {
        return Err(AppError::BadRequest(format!(
            "result set too large: > {MAX_EXPORT_ROWS} rows; narrow the date range"
        )));
    }

    let csv_bytes = Bytes::from(build_csv(&selection.records).map_err(AppError::Internal)?);
    tracing::info!(rows = selection.records.len(), "CSV export built");

    build_csv_response(EXPORT_FILENAME, csv_bytes)
}

/// Serialise rows with the canonical header. An empty selection still gets
/// the header line so re-importing it is a no-op rather than an error.
pub fn build_csv(rows: &[MetricRecord]) -> anyhow::Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::with_capacity(rows.len().saturating_mul(96)));

    wtr.write_record([
        "date",
        "channel",
        "campaign",
        "sessions",
        "conversions",
        "bounce_rate",
        "engagement_or_ctr",
        "cost",
    ])
    .map_err(|e| anyhow::anyhow!("csv write_record failed: {e}"))?;

    for row in rows {
        wtr.serialize(row)
            .map_err(|e| anyhow::anyhow!("csv serialize failed: {e}"))?;
    }

    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("csv flush failed: {e}"))
}

fn build_csv_response(filename: &str, csv_bytes: Bytes) -> Result<Response, AppError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(axum::body::Body::from(csv_bytes))
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
}
