//! Export Routes
//!
//! - GET /api/v1/export/:metric - Displayable series as CSV

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::routes::charts::parse_metric;
use crate::api::state::AppState;

/// GET /api/v1/export/:metric
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Path(metric): Path<String>,
) -> ApiResult<Response> {
    let metric = parse_metric(&metric)?;
    let csv = state.controller.snapshot().chart(metric).to_csv()?;

    let disposition = format!("attachment; filename=\"{}.csv\"", metric);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}
