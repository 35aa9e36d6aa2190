use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use crate::{error::AppError, state::AppState};

const MAX_SEED_DAYS: u32 = 366;

#[derive(Debug, Default, Deserialize)]
pub struct SeedRequest {
    pub days: Option<u32>,
    /// Fixed RNG seed for reproducible data; random when absent.
    pub seed: Option<u64>,
}

/// `POST /api/seed`: replace the local store with freshly generated rows.
///
/// An empty body is accepted and uses the configured day count.
#[tracing::instrument(skip(state, body))]
pub async fn seed_store(
    State(state): State<Arc<AppState>>,
    body: Option<Json<SeedRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let days = req.days.unwrap_or(state.config.seed_days);
    if days == 0 || days > MAX_SEED_DAYS {
        return Err(AppError::invalid(
            "days",
            format!("days must be between 1 and {MAX_SEED_DAYS}"),
        ));
    }

    let rows = state
        .reseed(days, req.seed.unwrap_or_else(rand::random))
        .await
        .map_err(AppError::Internal)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": { "rows": rows, "days": days } })),
    ))
}
