use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use campaignlens_core::engine::daily_sessions;
use campaignlens_core::forecast::{fit_trend, forecast};

use super::{select, FilterQuery};
use crate::{error::AppError, state::AppState};

/// Horizons offered by the dashboard's forecast picker.
pub const ALLOWED_HORIZONS: [u32; 3] = [14, 30, 90];
pub const DEFAULT_HORIZON: u32 = 30;

#[derive(Debug, Deserialize)]
pub struct ForecastParams {
    pub horizon: Option<u32>,
}

/// `GET /api/forecast`: historical daily sessions for the selection plus a
/// linear projection `horizon` days past the last date.
///
/// Fewer than two distinct days yields the history unchanged and a null trend.
#[tracing::instrument(skip(state))]
pub async fn get_forecast(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
    Query(params): Query<ForecastParams>,
) -> Result<impl IntoResponse, AppError> {
    let horizon = params.horizon.unwrap_or(DEFAULT_HORIZON);
    if !ALLOWED_HORIZONS.contains(&horizon) {
        return Err(AppError::invalid(
            "horizon",
            format!("horizon must be one of {ALLOWED_HORIZONS:?}"),
        ));
    }

    let selection = select(&state, &query).await?;
    let series = daily_sessions(&selection.records);
    let trend = fit_trend(&series);
    let points = forecast(&series, horizon);

    Ok(Json(json!({
        "data": {
            "horizon": horizon,
            "points": points,
            "trend": trend,
        }
    })))
}
