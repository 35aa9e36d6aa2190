use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{error::AppError, import::parse_csv, state::AppState};

/// Rejected rows echoed back in the response; the rest are only counted.
const MAX_REPORTED_ERRORS: usize = 20;

#[derive(Debug, Default, Deserialize)]
pub struct ImportParams {
    /// `append` (default) or `replace`.
    pub mode: Option<String>,
}

/// `POST /api/import`: load a CSV body into the local store.
///
/// Rows that fail validation are skipped and reported by line number; a
/// missing required column rejects the whole upload.
#[tracing::instrument(skip(state, body), fields(bytes = body.len()))]
pub async fn import_records(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ImportParams>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let replace = match params.mode.as_deref() {
        None | Some("append") => false,
        Some("replace") => true,
        Some(other) => {
            return Err(AppError::invalid(
                "mode",
                format!("unsupported mode: {other}; expected 'append' or 'replace'"),
            ))
        }
    };
    if body.is_empty() {
        return Err(AppError::BadRequest("request body is empty".to_string()));
    }

    let outcome = parse_csv(body.as_ref()).map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .store_imported(&outcome.records, replace)
        .await
        .map_err(AppError::Internal)?;

    tracing::info!(
        imported = outcome.records.len(),
        rejected = outcome.rejected.len(),
        replace,
        "CSV import finished"
    );

    let errors: Vec<_> = outcome.rejected.iter().take(MAX_REPORTED_ERRORS).collect();
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "data": {
                "imported": outcome.records.len(),
                "rejected": outcome.rejected.len(),
                "errors": errors,
                "ignored_columns": outcome.ignored_columns,
                "mode": if replace { "replace" } else { "append" },
            }
        })),
    ))
}
