//! Country Routes
//!
//! - GET  /api/v1/countries - Country directory
//! - POST /api/v1/countries/reload - Fetch the directory again
//! - POST /api/v1/countries/:code/select - Select a country by ISO code

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{CountriesResponse, SelectionResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// GET /api/v1/countries
pub async fn list_countries(State(state): State<Arc<AppState>>) -> Json<CountriesResponse> {
    let snapshot = state.controller.snapshot();
    let countries: Vec<_> = snapshot.directory.iter().cloned().collect();

    Json(CountriesResponse {
        count: countries.len(),
        countries,
    })
}

/// POST /api/v1/countries/reload
///
/// Recovers from a failed directory fetch at start-up.
pub async fn reload_countries(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CountriesResponse>> {
    state.controller.load_directory().await?;
    Ok(list_countries(State(state)).await)
}

/// POST /api/v1/countries/:code/select
///
/// Fetches the country and adds it to the selection once the data is in.
pub async fn select_by_code(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> ApiResult<Json<SelectionResponse>> {
    let outcome = state.controller.select_by_code(&code).await?;
    let snapshot = state.controller.snapshot();

    Ok(Json(SelectionResponse {
        countries: snapshot.selected.clone(),
        fetched: vec![outcome],
        last_error: snapshot.last_error.clone(),
    }))
}
