//! Chart Routes
//!
//! Chart payloads for the external chart component.
//!
//! - GET /api/v1/charts - Cases and deaths charts
//! - GET /api/v1/charts/:metric - One chart (`cases` or `deaths`)
//! - PUT /api/v1/chart-style - Change the default style

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{ChartQuery, ChartStyleRequest, ChartsResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::series::{ChartPayload, ChartStyle, Metric};

/// Style from the query string, or the dashboard's current one
pub(crate) fn resolve_style(query: &ChartQuery, current: ChartStyle) -> ApiResult<ChartStyle> {
    match &query.style {
        Some(s) => s.parse().map_err(ApiError::Validation),
        None => Ok(current),
    }
}

pub(crate) fn parse_metric(s: &str) -> ApiResult<Metric> {
    s.parse().map_err(ApiError::Validation)
}

/// GET /api/v1/charts
pub async fn get_charts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChartQuery>,
) -> ApiResult<Json<ChartsResponse>> {
    let snapshot = state.controller.snapshot();
    let style = resolve_style(&query, snapshot.chart_style)?;

    let charts = Metric::ALL
        .iter()
        .map(|m| snapshot.chart_with_style(*m, style))
        .collect();

    Ok(Json(ChartsResponse {
        style,
        charts,
        last_error: snapshot.last_error.clone(),
    }))
}

/// GET /api/v1/charts/:metric
pub async fn get_chart(
    State(state): State<Arc<AppState>>,
    Path(metric): Path<String>,
    Query(query): Query<ChartQuery>,
) -> ApiResult<Json<ChartPayload>> {
    let metric = parse_metric(&metric)?;
    let snapshot = state.controller.snapshot();
    let style = resolve_style(&query, snapshot.chart_style)?;

    Ok(Json(snapshot.chart_with_style(metric, style)))
}

/// PUT /api/v1/chart-style
pub async fn set_chart_style(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChartStyleRequest>,
) -> ApiResult<StatusCode> {
    let style: ChartStyle = req.style.parse().map_err(ApiError::Validation)?;
    state.controller.set_chart_style(style).await?;
    Ok(StatusCode::NO_CONTENT)
}
