use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use super::{select, FilterQuery};
use crate::{error::AppError, state::AppState};

/// `GET /api/records`: the filtered rows, in store order.
#[tracing::instrument(skip(state))]
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<impl IntoResponse, AppError> {
    let selection = select(&state, &query).await?;
    Ok(Json(json!({
        "data": selection.records,
        "meta": {
            "total": selection.records.len(),
            "served_from": selection.dataset.served_from,
            "filters": selection.applied(),
        }
    })))
}
