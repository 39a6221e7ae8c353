//! Wire types for the statistics API
//!
//! Every response is wrapped in a `data` envelope. Fields the API sometimes
//! omits (or sends as `null`) are optional here so that a partial record
//! decodes instead of failing the whole response.

use serde::{Deserialize, Serialize};

/// Response envelope: `{ "data": ... }`
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
}

/// One entry of the country list endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountrySummary {
    pub name: String,
    pub code: String,
}

/// One day of a country's timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Date as reported (`YYYY-MM-DD` or an RFC 3339 timestamp)
    pub date: String,
    /// Cumulative confirmed cases
    #[serde(default)]
    pub confirmed: Option<u64>,
    /// Cumulative deaths
    #[serde(default)]
    pub deaths: Option<u64>,
}

impl DailyRecord {
    pub fn new(date: impl Into<String>, confirmed: u64, deaths: u64) -> Self {
        Self {
            date: date.into(),
            confirmed: Some(confirmed),
            deaths: Some(deaths),
        }
    }
}

/// A country as returned by the detail endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryDetail {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub timeline: Vec<DailyRecord>,
}
