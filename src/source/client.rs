//! Statistics API Client
//!
//! HTTP client for the list and detail endpoints.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

use super::types::{CountryDetail, CountrySummary, Envelope};

/// Statistics API client
pub struct SourceClient {
    client: Client,
    config: SourceConfig,
}

/// Configuration for the statistics client
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Base URL of the API (e.g., "https://corona-api.com")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://corona-api.com".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

impl SourceClient {
    /// Create a new client with the given configuration
    pub fn new(config: SourceConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(SourceError::Request)?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Check that the API answers the list endpoint
    pub async fn health_check(&self) -> Result<(), SourceError> {
        let response = self
            .client
            .get(self.url("/countries"))
            .send()
            .await
            .map_err(classify)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(SourceError::Unavailable)
        }
    }

    /// GET /countries
    pub async fn list_countries(&self) -> Result<Vec<CountrySummary>, SourceError> {
        let url = self.url("/countries");
        tracing::debug!(url = %url, "Fetching country list");
        self.get_data(&url, "/countries").await
    }

    /// GET /countries/{code}
    pub async fn country_detail(&self, code: &str) -> Result<CountryDetail, SourceError> {
        let path = format!("/countries/{}", urlencoding::encode(code));
        let url = self.url(&path);
        tracing::debug!(url = %url, code = %code, "Fetching country detail");
        self.get_data(&url, &path).await
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        url: &str,
        endpoint: &str,
    ) -> Result<T, SourceError> {
        let response = self.client.get(url).send().await.map_err(classify)?;
        let response = check_status(response).await?;

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        envelope.data.ok_or_else(|| SourceError::MissingData {
            endpoint: endpoint.to_string(),
        })
    }
}

async fn check_status(response: Response) -> Result<Response, SourceError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    Err(SourceError::ApiError {
        status: status.as_u16(),
        message: text,
    })
}

fn classify(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else if e.is_connect() {
        SourceError::Unavailable
    } else {
        SourceError::Request(e)
    }
}

// ============================================
// Errors
// ============================================

/// Errors that can occur when talking to the statistics API
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Statistics API unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Response from {endpoint} has no data")]
    MissingData { endpoint: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}
