//! Covidash REST API
//!
//! HTTP API layer for the dashboard, built with Axum.
//!
//! # Endpoints
//!
//! ## Countries
//! - `GET /api/v1/countries` - Country directory
//! - `POST /api/v1/countries/reload` - Fetch the country directory again
//! - `POST /api/v1/countries/:code/select` - Select a country by ISO code
//!
//! ## Selection
//! - `GET /api/v1/selection` - Selected countries
//! - `PUT /api/v1/selection` - Replace the selection
//! - `POST /api/v1/selection/:name` - Add a country
//! - `DELETE /api/v1/selection/:name` - Remove a country
//! - `GET /api/v1/state` - Dashboard status
//!
//! ## Charts
//! - `GET /api/v1/charts` - Cases and deaths chart payloads
//! - `GET /api/v1/charts/:metric` - One chart payload
//! - `PUT /api/v1/chart-style` - Change the default chart style
//! - `GET /api/v1/export/:metric` - CSV export
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /api/v1/ws` - Dashboard event stream

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::websocket::{spawn_event_forwarder, websocket_handler};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Country routes
        .route("/countries", get(routes::countries::list_countries))
        .route("/countries/reload", post(routes::countries::reload_countries))
        .route("/countries/:code/select", post(routes::countries::select_by_code))
        // Selection routes
        .route(
            "/selection",
            get(routes::selection::get_selection).put(routes::selection::replace_selection),
        )
        .route(
            "/selection/:name",
            post(routes::selection::add_country).delete(routes::selection::remove_country),
        )
        .route("/state", get(routes::selection::get_status))
        // Chart routes
        .route("/charts", get(routes::charts::get_charts))
        .route("/charts/:metric", get(routes::charts::get_chart))
        .route("/chart-style", put(routes::charts::set_chart_style))
        // Export routes
        .route("/export/:metric", get(routes::export::export_csv))
        // WebSocket route
        .route("/ws", get(websocket_handler));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let timeout = Duration::from_millis(state.config.request_timeout_ms);
    let cors = cors_layer(&state.config);
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        .with_state(shared_state)
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let forwarder = spawn_event_forwarder(state.controller.subscribe(), Arc::clone(&state.ws_hub));
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Covidash API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    forwarder.abort();
    tracing::info!("Covidash API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{ControllerConfig, SelectionController};
    use crate::source::{CountryDetail, DailyRecord, StaticSource};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::util::ServiceExt;

    fn fixture() -> StaticSource {
        StaticSource::new(vec![
            CountryDetail {
                name: "Italy".to_string(),
                code: "IT".to_string(),
                timeline: vec![
                    DailyRecord::new("2020-03-01", 1694, 34),
                    DailyRecord::new("2020-03-02", 2036, 52),
                ],
            },
            CountryDetail {
                name: "Spain".to_string(),
                code: "ES".to_string(),
                timeline: vec![
                    DailyRecord::new("2020-03-01", 84, 0),
                    DailyRecord::new("2020-03-02", 120, 0),
                ],
            },
        ])
    }

    async fn create_test_app() -> Router {
        let (controller, _task) =
            SelectionController::spawn(Arc::new(fixture()), ControllerConfig::default());
        controller.load_directory().await.unwrap();

        build_router(AppState::new(controller, ApiConfig::default()))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    fn json(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = create_test_app().await;

        let (status, _) = send(&app, "GET", "/health/live", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "GET", "/health/ready", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["status"], "healthy");
    }

    #[tokio::test]
    async fn test_not_ready_without_directory() {
        let (controller, _task) =
            SelectionController::spawn(Arc::new(fixture()), ControllerConfig::default());
        let app = build_router(AppState::new(controller, ApiConfig::default()));

        let (status, _) = send(&app, "GET", "/health/ready", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, body) = send(&app, "POST", "/api/v1/countries/reload", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["count"], 2);

        let (status, _) = send(&app, "GET", "/health/ready", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_countries() {
        let app = create_test_app().await;

        let (status, body) = send(&app, "GET", "/api/v1/countries", None).await;
        assert_eq!(status, StatusCode::OK);

        let body = json(&body);
        assert_eq!(body["count"], 2);
        assert_eq!(body["countries"][0]["name"], "Italy");
        assert_eq!(
            body["countries"][0]["flag_url"],
            "https://www.countryflags.io/IT/shiny/32.png"
        );
    }

    #[tokio::test]
    async fn test_add_country_and_chart() {
        let app = create_test_app().await;

        let (status, body) = send(&app, "POST", "/api/v1/selection/Italy", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json(&body)["fetched"][0], "merged");

        let (status, body) = send(&app, "GET", "/api/v1/charts?style=line", None).await;
        assert_eq!(status, StatusCode::OK);

        let body = json(&body);
        assert_eq!(body["style"], "line");
        assert_eq!(body["charts"][0]["title"], "Number of Cases");
        assert_eq!(body["charts"][0]["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["charts"][0]["data"][0]["Italy"], 1694);
        assert_eq!(body["charts"][1]["names"][0], "Italy");
    }

    #[tokio::test]
    async fn test_replace_selection_and_alignment() {
        let app = create_test_app().await;

        let (status, body) = send(
            &app,
            "PUT",
            "/api/v1/selection",
            Some(r#"{"countries": ["Italy", "Spain"]}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["countries"].as_array().unwrap().len(), 2);

        // Spain reports cases on both days but no deaths above the floor
        let (_, body) = send(&app, "GET", "/api/v1/charts/cases", None).await;
        assert_eq!(json(&body)["data"].as_array().unwrap().len(), 2);

        let (_, body) = send(&app, "GET", "/api/v1/charts/deaths", None).await;
        assert!(json(&body)["data"].as_array().unwrap().is_empty());

        let (status, body) = send(&app, "DELETE", "/api/v1/selection/Spain", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["countries"][0], "Italy");

        let (_, body) = send(&app, "GET", "/api/v1/charts/deaths", None).await;
        assert_eq!(json(&body)["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_select_by_code() {
        let app = create_test_app().await;

        let (status, body) = send(&app, "POST", "/api/v1/countries/es/select", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["countries"][0], "Spain");
    }

    #[tokio::test]
    async fn test_unknown_country() {
        let app = create_test_app().await;

        let (status, body) = send(&app, "POST", "/api/v1/selection/Atlantis", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json(&body)["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_invalid_style_and_metric() {
        let app = create_test_app().await;

        let (status, _) = send(&app, "GET", "/api/v1/charts?style=pie", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "GET", "/api/v1/charts/recovered", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "PUT",
            "/api/v1/chart-style",
            Some(r#"{"style": "donut"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_set_chart_style() {
        let app = create_test_app().await;

        let (status, _) = send(&app, "PUT", "/api/v1/chart-style", Some(r#"{"style": "bar"}"#)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        // The style command is queued; the state endpoint reflects it once applied
        let mut style = Value::Null;
        for _ in 0..50 {
            let (_, body) = send(&app, "GET", "/api/v1/state", None).await;
            style = json(&body)["chart_style"].clone();
            if style == "bar" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(style, "bar");
    }

    #[tokio::test]
    async fn test_export_csv() {
        let app = create_test_app().await;
        send(&app, "POST", "/api/v1/selection/Italy", None).await;

        let (status, body) = send(&app, "GET", "/api/v1/export/cases", None).await;
        assert_eq!(status, StatusCode::OK);

        let text = String::from_utf8(body).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,label,Italy");
        assert_eq!(lines[1], "2020-03-01,Mar-01,1694");
    }
}
