//! # Covidash
//!
//! Backend for a country-selection COVID-19 dashboard. It fetches per-country
//! daily timelines from a statistics API, merges them into two date-keyed
//! series (cases and deaths) and serves chart-ready payloads over HTTP.
//!
//! ## Modules
//!
//! - [`source`]: Statistics API client and offline fixture source
//! - [`series`]: Aggregation, display filtering and chart payloads
//! - [`dashboard`]: Country directory, selection state and its controller
//! - [`api`]: REST API server with Axum
//! - [`websocket`]: Push notifications for dashboard changes
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use covidash::config::Config;
//! use covidash::dashboard::SelectionController;
//! use covidash::series::Metric;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let source = config.build_source()?;
//!     let (controller, _task) = SelectionController::spawn(source, config.controller_config());
//!
//!     controller.load_directory().await?;
//!     controller.select_by_code("IT").await?;
//!
//!     let chart = controller.snapshot().chart(Metric::Cases);
//!     println!("{}", chart.render_table());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod dashboard;
pub mod series;
pub mod source;
pub mod websocket;

// Re-export top-level types for convenience
pub use source::{
    CountryDetail, CountrySource, CountrySummary, DailyRecord, SourceClient, SourceError,
    StaticSource,
};

pub use series::{
    displayable, merge_timeline, AggregatedDatum, Aggregator, ChartPayload, ChartStyle, Metric,
    SeriesMap, Thresholds,
};

pub use dashboard::{
    Country, CountryDirectory, DashboardError, DashboardEvent, DashboardState, DashboardStatus,
    FetchOutcome, SelectionController,
};

pub use api::{build_router, serve, ApiError, AppState};

pub use websocket::{ClientMessage, ConnectionHub, HubConfig, ServerMessage, WsEvent};

pub use config::{Config, ConfigError, LoggingConfig};
