//! Series Aggregator
//!
//! Merges one country's timeline into the running cases and deaths mappings.
//!
//! Merge rule per record and metric:
//! - missing value, or value not above the metric's floor: skipped
//! - unparseable date: skipped
//! - stored value for this country already >= incoming: no-op
//! - otherwise the date entry is created if absent and the value is set
//!
//! The result is always a fresh mapping; the inputs are never touched.

use crate::source::{CountryDetail, DailyRecord};

use super::types::{parse_record_date, AggregatedDatum, Metric, SeriesMap, Thresholds};

/// Merges country timelines using the configured noise floors
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    thresholds: Thresholds,
}

impl Aggregator {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Merge a country's timeline into both mappings
    ///
    /// Returns `(cases, deaths)`.
    pub fn merge(
        &self,
        country: &CountryDetail,
        cases: &SeriesMap,
        deaths: &SeriesMap,
    ) -> (SeriesMap, SeriesMap) {
        let new_cases = merge_timeline(
            &country.name,
            &country.timeline,
            cases,
            Metric::Cases,
            self.thresholds.cases_floor,
        );
        let new_deaths = merge_timeline(
            &country.name,
            &country.timeline,
            deaths,
            Metric::Deaths,
            self.thresholds.deaths_floor,
        );

        tracing::debug!(
            country = %country.name,
            records = country.timeline.len(),
            case_dates = new_cases.len(),
            death_dates = new_deaths.len(),
            "Merged timeline"
        );

        (new_cases, new_deaths)
    }
}

/// Merge one metric of a timeline into a copy of `existing`
pub fn merge_timeline(
    country: &str,
    timeline: &[DailyRecord],
    existing: &SeriesMap,
    metric: Metric,
    floor: u64,
) -> SeriesMap {
    let mut merged = existing.clone();
    let mut skipped_dates = 0usize;

    for record in timeline {
        let value = match metric.value_of(record) {
            Some(v) if v > floor => v,
            _ => continue,
        };

        let Some(date) = parse_record_date(&record.date) else {
            skipped_dates += 1;
            continue;
        };

        let entry = merged
            .entry(date)
            .or_insert_with(|| AggregatedDatum::new(date));

        match entry.values.get(country) {
            Some(&stored) if stored >= value => {}
            _ => {
                entry.values.insert(country.to_string(), value);
            }
        }
    }

    if skipped_dates > 0 {
        tracing::debug!(
            country = %country,
            metric = %metric,
            skipped = skipped_dates,
            "Skipped records with malformed dates"
        );
    }

    merged
}
