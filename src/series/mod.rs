//! Series Core
//!
//! Turns per-country daily timelines into date-aligned series ready for a
//! chart component.
//!
//! ## Pipeline
//!
//! 1. [`Aggregator`] merges a country's timeline into the running cases and
//!    deaths mappings (max-or-create with a per-metric noise floor)
//! 2. [`displayable`] keeps only the dates every selected country has
//!    reported, in ascending order
//! 3. [`ChartPayload`] bundles the result with a title and series names

mod aggregator;
mod chart;
mod filter;
mod types;

pub use aggregator::{merge_timeline, Aggregator};
pub use chart::{ChartPayload, ChartStyle, ExportError};
pub use filter::displayable;
pub use types::{parse_record_date, AggregatedDatum, Metric, SeriesMap, Thresholds};
