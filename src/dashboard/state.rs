//! Dashboard State
//!
//! One immutable snapshot of everything the dashboard shows. Every update
//! takes `&self` and returns a new snapshot; nothing is mutated in place.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::series::{Aggregator, ChartPayload, ChartStyle, Metric, SeriesMap};
use crate::source::CountryDetail;

use super::directory::CountryDirectory;

/// Snapshot of the dashboard
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    /// Selectable countries
    pub directory: CountryDirectory,
    /// Selected country names, in selection order
    pub selected: Vec<String>,
    /// Aggregated confirmed cases
    pub cases: SeriesMap,
    /// Aggregated deaths
    pub deaths: SeriesMap,
    /// Style the chart component should draw
    pub chart_style: ChartStyle,
    /// Most recent fetch failure, cleared by the next successful merge
    pub last_error: Option<String>,
    /// In-flight fetches: country name -> generation
    pub pending: BTreeMap<String, u64>,
    /// Bumped on every update
    pub version: u64,
}

/// Result of applying a new selection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionDiff {
    /// Names that appeared and need fetching
    pub added: Vec<String>,
    /// Names that were dropped
    pub removed: Vec<String>,
}

impl SelectionDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

impl DashboardState {
    fn next(&self) -> Self {
        let mut state = self.clone();
        state.version += 1;
        state
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.iter().any(|s| s == name)
    }

    /// Replace the directory
    pub fn with_directory(&self, directory: CountryDirectory) -> Self {
        let mut state = self.next();
        state.directory = directory;
        state
    }

    /// Add operation: select the country (if not already) and merge its
    /// timeline into the aggregated series
    pub fn with_detail(&self, detail: &CountryDetail, aggregator: &Aggregator) -> Self {
        let mut state = self.next();

        if !state.is_selected(&detail.name) {
            state.selected.push(detail.name.clone());
        }

        let (cases, deaths) = aggregator.merge(detail, &self.cases, &self.deaths);
        state.cases = cases;
        state.deaths = deaths;
        state.pending.remove(&detail.name);
        state.last_error = None;
        state
    }

    /// Replace operation: take a whole new selection
    ///
    /// Duplicates in `names` are dropped (first occurrence kept). Returns the
    /// new state together with the symmetric difference against the previous
    /// selection. Removed countries keep their aggregated fields; only their
    /// in-flight fetches are forgotten so late results get discarded.
    pub fn with_selection(&self, names: Vec<String>) -> (Self, SelectionDiff) {
        let mut selected: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            if !selected.contains(&name) {
                selected.push(name);
            }
        }

        let diff = SelectionDiff {
            added: selected
                .iter()
                .filter(|n| !self.is_selected(n))
                .cloned()
                .collect(),
            removed: self
                .selected
                .iter()
                .filter(|n| !selected.contains(n))
                .cloned()
                .collect(),
        };

        let mut state = self.next();
        for name in &diff.removed {
            state.pending.remove(name);
        }
        state.selected = selected;

        (state, diff)
    }

    /// Remove one country from the selection
    pub fn without_country(&self, name: &str) -> (Self, SelectionDiff) {
        let remaining = self
            .selected
            .iter()
            .filter(|n| n.as_str() != name)
            .cloned()
            .collect();
        self.with_selection(remaining)
    }

    /// Record that a fetch for `name` was started with `generation`
    pub fn with_pending(&self, name: &str, generation: u64) -> Self {
        let mut state = self.next();
        state.pending.insert(name.to_string(), generation);
        state
    }

    /// Whether a fetch completion is still wanted
    pub fn accepts(&self, name: &str, generation: u64) -> bool {
        self.pending.get(name) == Some(&generation)
    }

    /// Record a fetch failure for `name`
    ///
    /// The country is dropped from the selection: without data it would
    /// blank both charts, and keeping it selected would make a retry a no-op.
    pub fn with_failure(&self, name: &str, message: impl Into<String>) -> Self {
        let mut state = self.next();
        state.pending.remove(name);
        state.selected.retain(|s| s != name);
        state.last_error = Some(message.into());
        state
    }

    /// Record a failure not tied to one country
    pub fn with_error(&self, message: impl Into<String>) -> Self {
        let mut state = self.next();
        state.last_error = Some(message.into());
        state
    }

    pub fn with_chart_style(&self, style: ChartStyle) -> Self {
        let mut state = self.next();
        state.chart_style = style;
        state
    }

    /// Aggregated mapping for a metric
    pub fn series(&self, metric: Metric) -> &SeriesMap {
        match metric {
            Metric::Cases => &self.cases,
            Metric::Deaths => &self.deaths,
        }
    }

    /// Chart payload for one metric, in the current style
    pub fn chart(&self, metric: Metric) -> ChartPayload {
        self.chart_with_style(metric, self.chart_style)
    }

    pub fn chart_with_style(&self, metric: Metric, style: ChartStyle) -> ChartPayload {
        ChartPayload::build(metric, style, self.series(metric), &self.selected)
    }

    /// Both charts (cases, deaths)
    pub fn charts(&self) -> Vec<ChartPayload> {
        Metric::ALL.iter().map(|m| self.chart(*m)).collect()
    }

    pub fn status(&self) -> DashboardStatus {
        DashboardStatus {
            version: self.version,
            countries_known: self.directory.len(),
            selected: self.selected.clone(),
            chart_style: self.chart_style,
            pending: self.pending.keys().cloned().collect(),
            last_error: self.last_error.clone(),
            case_dates: self.cases.len(),
            death_dates: self.deaths.len(),
        }
    }
}

/// Serializable summary of a snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardStatus {
    pub version: u64,
    pub countries_known: usize,
    pub selected: Vec<String>,
    pub chart_style: ChartStyle,
    pub pending: Vec<String>,
    pub last_error: Option<String>,
    pub case_dates: usize,
    pub death_dates: usize,
}
