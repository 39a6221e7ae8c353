//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

use crate::dashboard::{Country, FetchOutcome};
use crate::series::{ChartPayload, ChartStyle};

// ============================================
// COUNTRY DTOs
// ============================================

/// Country directory response
#[derive(Debug, Serialize, Deserialize)]
pub struct CountriesResponse {
    pub countries: Vec<Country>,
    pub count: usize,
}

// ============================================
// SELECTION DTOs
// ============================================

/// Replace the whole selection
#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub countries: Vec<String>,
}

/// Current selection plus what the request triggered
#[derive(Debug, Serialize, Deserialize)]
pub struct SelectionResponse {
    pub countries: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fetched: Vec<FetchOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

// ============================================
// CHART DTOs
// ============================================

/// Optional style override for chart endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    #[serde(default)]
    pub style: Option<String>,
}

/// Both charts of the dashboard
#[derive(Debug, Serialize, Deserialize)]
pub struct ChartsResponse {
    pub style: ChartStyle,
    pub charts: Vec<ChartPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Change the default chart style
#[derive(Debug, Deserialize)]
pub struct ChartStyleRequest {
    pub style: String,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy", "degraded", "unhealthy"
    pub status: String,
    /// Directory status: "ok" or "empty"
    pub directory: String,
    /// Number of pending fetches
    pub pending_fetches: usize,
    /// Open WebSocket connections
    pub ws_connections: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Server version
    pub version: String,
}
