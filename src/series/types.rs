//! Core series types
//!
//! - `Metric`: which counter of a daily record is being charted
//! - `Thresholds`: per-metric noise floors
//! - `AggregatedDatum`: one date with one value per country
//! - `SeriesMap`: date-keyed collection of aggregated data

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::source::DailyRecord;

/// Display label format for a date (`Mar-01`)
pub const LABEL_FORMAT: &str = "%b-%d";

/// Date-keyed aggregated mapping
///
/// Keys are unique and iterate in ascending date order.
pub type SeriesMap = BTreeMap<NaiveDate, AggregatedDatum>;

/// A charted metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Confirmed cases
    Cases,
    /// Deaths
    Deaths,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Cases, Metric::Deaths];

    /// Default noise floor: a value must exceed this to be recorded
    pub fn floor(&self) -> u64 {
        match self {
            Metric::Cases => 20,
            Metric::Deaths => 1,
        }
    }

    /// Chart title
    pub fn title(&self) -> &'static str {
        match self {
            Metric::Cases => "Number of Cases",
            Metric::Deaths => "Number of Deaths",
        }
    }

    /// Pick this metric's value out of a daily record
    pub fn value_of(&self, record: &DailyRecord) -> Option<u64> {
        match self {
            Metric::Cases => record.confirmed,
            Metric::Deaths => record.deaths,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cases => "cases",
            Metric::Deaths => "deaths",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cases" | "confirmed" => Ok(Metric::Cases),
            "deaths" => Ok(Metric::Deaths),
            _ => Err(format!("Invalid metric: {}. Use cases or deaths", s)),
        }
    }
}

/// Noise floors per metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub cases_floor: u64,
    pub deaths_floor: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cases_floor: Metric::Cases.floor(),
            deaths_floor: Metric::Deaths.floor(),
        }
    }
}

impl Thresholds {
    pub fn floor(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Cases => self.cases_floor,
            Metric::Deaths => self.deaths_floor,
        }
    }
}

/// One date of an aggregated series
///
/// Serializes flat, the way chart components expect it:
/// `{ "date": "2020-03-01", "label": "Mar-01", "Italy": 1694, "Spain": 84 }`
///
/// Country names share the object with `date` and `label`; a country literally
/// named "date" or "label" would collide with them when serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedDatum {
    pub date: NaiveDate,
    pub label: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, u64>,
}

impl AggregatedDatum {
    /// Create an empty datum for a date, stamping its display label
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            label: date.format(LABEL_FORMAT).to_string(),
            values: BTreeMap::new(),
        }
    }

    /// Builder method: set a country's value
    pub fn with(mut self, country: impl Into<String>, value: u64) -> Self {
        self.values.insert(country.into(), value);
        self
    }

    pub fn get(&self, country: &str) -> Option<u64> {
        self.values.get(country).copied()
    }

    /// Number of countries with a strictly positive value among `countries`
    pub fn positive_count(&self, countries: &[String]) -> usize {
        countries
            .iter()
            .filter(|name| self.get(name).map_or(false, |v| v > 0))
            .count()
    }
}

/// Parse a record date
///
/// Accepts plain dates (`2020-03-01`) and RFC 3339 timestamps
/// (`2020-03-01T20:00:00Z`). Anything else is treated as malformed.
pub fn parse_record_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}
