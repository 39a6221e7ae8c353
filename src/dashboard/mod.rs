//! Dashboard
//!
//! Country directory, the dashboard state snapshot, and the controller that
//! applies selection changes and fetch results to it.
//!
//! ## Data Flow
//!
//! 1. The directory is fetched once when the controller starts
//! 2. Selecting a country fetches its timeline
//! 3. The timeline is merged into the running cases/deaths series
//! 4. Chart payloads are derived from the latest snapshot on demand

mod controller;
mod directory;
mod state;

pub use controller::{
    ControllerConfig, DashboardEvent, FetchOutcome, FetchReply, SelectionController,
};
pub use directory::{Country, CountryDirectory, DEFAULT_FLAG_URL_TEMPLATE};
pub use state::{DashboardState, DashboardStatus, SelectionDiff};

use thiserror::Error;

use crate::source::SourceError;

/// Errors surfaced by the selection controller
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Name or code not present in the directory
    #[error("Unknown country: {0}")]
    UnknownCountry(String),

    /// Fetch from the statistics API failed
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Controller task is no longer running
    #[error("Dashboard controller stopped")]
    Closed,
}
