//! Static Source
//!
//! Serves countries from memory. Loaded from a JSON file holding the
//! detail-endpoint payloads (`[{ name, code, timeline }]`), it lets the
//! dashboard run offline against a captured snapshot.

use async_trait::async_trait;
use std::path::Path;

use super::client::SourceError;
use super::types::{CountryDetail, CountrySummary};
use super::CountrySource;

/// In-memory country source
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    countries: Vec<CountryDetail>,
}

impl StaticSource {
    pub fn new(countries: Vec<CountryDetail>) -> Self {
        Self { countries }
    }

    /// Load a JSON array of country details
    pub fn from_json_file(path: &Path) -> Result<Self, SourceError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SourceError::Decode(format!("{}: {}", path.display(), e)))?;
        let countries: Vec<CountryDetail> = serde_json::from_str(&content)
            .map_err(|e| SourceError::Decode(format!("{}: {}", path.display(), e)))?;

        tracing::info!(
            path = %path.display(),
            countries = countries.len(),
            "Loaded static country data"
        );
        Ok(Self::new(countries))
    }
}

#[async_trait]
impl CountrySource for StaticSource {
    async fn list_countries(&self) -> Result<Vec<CountrySummary>, SourceError> {
        Ok(self
            .countries
            .iter()
            .map(|c| CountrySummary {
                name: c.name.clone(),
                code: c.code.clone(),
            })
            .collect())
    }

    async fn country_detail(&self, code: &str) -> Result<CountryDetail, SourceError> {
        self.countries
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code))
            .cloned()
            .ok_or_else(|| SourceError::ApiError {
                status: 404,
                message: format!("No country with code {}", code),
            })
    }
}
