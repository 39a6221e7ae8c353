//! Selection Routes
//!
//! - GET    /api/v1/selection - Selected countries
//! - PUT    /api/v1/selection - Replace the selection
//! - POST   /api/v1/selection/:name - Add a country
//! - DELETE /api/v1/selection/:name - Remove a country
//! - GET    /api/v1/state - Dashboard status

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{SelectionRequest, SelectionResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::dashboard::{DashboardStatus, FetchOutcome};

fn selection_response(state: &AppState, fetched: Vec<FetchOutcome>) -> Json<SelectionResponse> {
    let snapshot = state.controller.snapshot();
    Json(SelectionResponse {
        countries: snapshot.selected.clone(),
        fetched,
        last_error: snapshot.last_error.clone(),
    })
}

/// GET /api/v1/selection
pub async fn get_selection(State(state): State<Arc<AppState>>) -> Json<SelectionResponse> {
    selection_response(&state, Vec::new())
}

/// PUT /api/v1/selection
pub async fn replace_selection(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectionRequest>,
) -> ApiResult<Json<SelectionResponse>> {
    let fetched = state.controller.replace_selection(req.countries).await?;
    Ok(selection_response(&state, fetched))
}

/// POST /api/v1/selection/:name
pub async fn add_country(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<(StatusCode, Json<SelectionResponse>)> {
    let outcome = state.controller.add_country(&name).await?;
    let status = match outcome {
        FetchOutcome::Merged => StatusCode::CREATED,
        _ => StatusCode::OK,
    };
    Ok((status, selection_response(&state, vec![outcome])))
}

/// DELETE /api/v1/selection/:name
pub async fn remove_country(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<SelectionResponse>> {
    state.controller.remove_country(&name).await?;
    Ok(selection_response(&state, Vec::new()))
}

/// GET /api/v1/state
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<DashboardStatus> {
    Json(state.controller.snapshot().status())
}
