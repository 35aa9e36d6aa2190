use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use campaignlens_core::engine::{
    date_bounds, distinct_values, group_by, summarize, Dimension, Metric, Reducer,
};

use super::{select, FilterQuery};
use crate::{error::AppError, state::AppState};

const EMPTY_SELECTION_MESSAGE: &str = "No data available for the selected filters.";

/// `GET /api/dashboard`: everything the dashboard page renders.
///
/// Filter options are computed over the whole loaded dataset so narrowing the
/// selection never hides a choice. KPIs and charts use the filtered rows.
#[tracing::instrument(skip(state))]
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<impl IntoResponse, AppError> {
    let selection = select(&state, &query).await?;
    let all = selection.dataset.records.as_slice();
    let rows = selection.records.as_slice();

    let bounds = date_bounds(all);
    let empty = rows.is_empty();

    Ok(Json(json!({
        "data": {
            "status": selection.dataset.status,
            "source": {
                "requested": selection.dataset.requested,
                "served_from": selection.dataset.served_from,
            },
            "rejected_rows": selection.dataset.rejected,
            "filters": {
                "available": {
                    "channels": distinct_values(all, Dimension::Channel),
                    "campaigns": distinct_values(all, Dimension::Campaign),
                    "min_date": bounds.map(|(min, _)| min),
                    "max_date": bounds.map(|(_, max)| max),
                },
                "applied": selection.applied(),
            },
            "empty": empty,
            "message": empty.then_some(EMPTY_SELECTION_MESSAGE),
            "kpis": summarize(rows),
            "charts": {
                "daily_sessions":
                    group_by(rows, Dimension::Date, Metric::Sessions, Reducer::Sum),
                "conversions_by_channel":
                    group_by(rows, Dimension::Channel, Metric::Conversions, Reducer::Sum),
                "bounce_rate_by_campaign":
                    group_by(rows, Dimension::Campaign, Metric::BounceRate, Reducer::Mean),
                "engagement_by_channel":
                    group_by(rows, Dimension::Channel, Metric::EngagementOrCtr, Reducer::Mean),
            },
            "last_updated": selection.dataset.loaded_at.to_rfc3339(),
            "theme": state.config.theme,
        }
    })))
}
