//! Chart Payloads
//!
//! The data a chart component consumes: a title, the displayable series and
//! the names of the series to draw. Also renders the same payload as a text
//! table or CSV for terminal and export use.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::filter::displayable;
use super::types::{AggregatedDatum, Metric, SeriesMap};

/// Visual style the chart component should draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartStyle {
    Line,
    Bar,
    #[default]
    Area,
}

impl ChartStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartStyle::Line => "line",
            ChartStyle::Bar => "bar",
            ChartStyle::Area => "area",
        }
    }

    /// Label shown in a style picker
    pub fn label(&self) -> &'static str {
        match self {
            ChartStyle::Line => "Line Charts",
            ChartStyle::Bar => "Bar Charts",
            ChartStyle::Area => "Area Charts",
        }
    }
}

impl fmt::Display for ChartStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "line" => Ok(ChartStyle::Line),
            "bar" => Ok(ChartStyle::Bar),
            "area" => Ok(ChartStyle::Area),
            _ => Err(format!("Invalid chart style: {}. Use line, bar, or area", s)),
        }
    }
}

/// Everything a chart component needs to draw one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPayload {
    pub title: String,
    pub metric: Metric,
    pub style: ChartStyle,
    pub data: Vec<AggregatedDatum>,
    pub names: Vec<String>,
}

impl ChartPayload {
    /// Build the payload for `metric` from its aggregated mapping
    pub fn build(metric: Metric, style: ChartStyle, series: &SeriesMap, selected: &[String]) -> Self {
        Self {
            title: metric.title().to_string(),
            metric,
            style,
            data: displayable(series, selected),
            names: selected.to_vec(),
        }
    }

    /// Render as a fixed-width text table
    pub fn render_table(&self) -> String {
        let mut out = format!("{} ({})\n", self.title, self.style.label());

        if self.data.is_empty() {
            out.push_str("  (no dates reported by every selected country)\n");
            return out;
        }

        let widths: Vec<usize> = self
            .names
            .iter()
            .map(|name| {
                self.data
                    .iter()
                    .filter_map(|d| d.get(name))
                    .map(|v| v.to_string().len())
                    .max()
                    .unwrap_or(0)
                    .max(name.len())
            })
            .collect();

        out.push_str(&format!("{:<12}", "date"));
        for (name, width) in self.names.iter().zip(&widths) {
            out.push_str(&format!("  {:>width$}", name, width = width));
        }
        out.push('\n');

        for datum in &self.data {
            out.push_str(&format!("{:<12}", datum.date.format("%Y-%m-%d")));
            for (name, width) in self.names.iter().zip(&widths) {
                let value = datum.get(name).map(|v| v.to_string()).unwrap_or_default();
                out.push_str(&format!("  {:>width$}", value, width = width));
            }
            out.push('\n');
        }

        out
    }

    /// Render as CSV: `date,label,<country>...`
    pub fn to_csv(&self) -> Result<String, ExportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header = vec!["date".to_string(), "label".to_string()];
        header.extend(self.names.iter().cloned());
        writer.write_record(&header)?;

        for datum in &self.data {
            let mut row = vec![datum.date.format("%Y-%m-%d").to_string(), datum.label.clone()];
            row.extend(
                self.names
                    .iter()
                    .map(|name| datum.get(name).map(|v| v.to_string()).unwrap_or_default()),
            );
            writer.write_record(&row)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ExportError::Flush(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| ExportError::Encoding(e.to_string()))
    }
}

/// Errors from rendering a payload for export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to flush CSV writer: {0}")]
    Flush(String),

    #[error("Invalid UTF-8 in export: {0}")]
    Encoding(String),
}
