//! Statistics Source
//!
//! Client for the remote COVID-19 statistics API.
//!
//! ## Endpoints
//!
//! - `GET /countries` - list of known countries (`{ data: [{ name, code }] }`)
//! - `GET /countries/{code}` - one country with its daily timeline
//!
//! The dashboard depends on the [`CountrySource`] trait rather than on the
//! HTTP client directly, so any other source (a fixture, a cache) can be
//! plugged into the controller; [`StaticSource`] serves a captured snapshot
//! for offline use.

mod client;
mod fixture;
mod types;

pub use client::{SourceClient, SourceConfig, SourceError};
pub use fixture::StaticSource;
pub use types::{CountryDetail, CountrySummary, DailyRecord, Envelope};

use async_trait::async_trait;

/// Anything that can answer the two questions the dashboard asks
#[async_trait]
pub trait CountrySource: Send + Sync {
    /// Fetch the directory of known countries
    async fn list_countries(&self) -> Result<Vec<CountrySummary>, SourceError>;

    /// Fetch one country's detail, including its full timeline
    async fn country_detail(&self, code: &str) -> Result<CountryDetail, SourceError>;
}

#[async_trait]
impl CountrySource for SourceClient {
    async fn list_countries(&self) -> Result<Vec<CountrySummary>, SourceError> {
        SourceClient::list_countries(self).await
    }

    async fn country_detail(&self, code: &str) -> Result<CountryDetail, SourceError> {
        SourceClient::country_detail(self, code).await
    }
}
