//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api::ApiConfig as ServerConfig;
use crate::dashboard::{ControllerConfig, DEFAULT_FLAG_URL_TEMPLATE};
use crate::series::{ChartStyle, Metric, Thresholds};
use crate::source::{
    CountrySource, SourceClient, SourceConfig as ClientConfig, SourceError, StaticSource,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub series: SeriesConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Statistics API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_source_timeout")]
    pub request_timeout_ms: u64,

    /// Serve countries from this JSON file instead of the API
    pub fixture_path: Option<String>,
}

fn default_base_url() -> String {
    "https://corona-api.com".to_string()
}

fn default_source_timeout() -> u64 {
    10_000
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_source_timeout(),
            fixture_path: None,
        }
    }
}

/// Aggregation noise floors
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesConfig {
    #[serde(default = "default_cases_floor")]
    pub cases_floor: u64,

    #[serde(default = "default_deaths_floor")]
    pub deaths_floor: u64,
}

fn default_cases_floor() -> u64 {
    Metric::Cases.floor()
}

fn default_deaths_floor() -> u64 {
    Metric::Deaths.floor()
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            cases_floor: default_cases_floor(),
            deaths_floor: default_deaths_floor(),
        }
    }
}

/// Dashboard behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_flag_url_template")]
    pub flag_url_template: String,

    #[serde(default)]
    pub default_style: ChartStyle,

    /// ISO codes selected right after the directory loads
    #[serde(default)]
    pub initial_countries: Vec<String>,
}

fn default_flag_url_template() -> String {
    DEFAULT_FLAG_URL_TEMPLATE.to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            flag_url_template: default_flag_url_template(),
            default_style: ChartStyle::default(),
            initial_countries: Vec::new(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("covidash").join("config.toml")),
            Some(PathBuf::from("/etc/covidash/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Source overrides
        if let Some(url) = lookup("COVIDASH_API_BASE_URL") {
            self.source.base_url = url;
        }
        if let Some(path) = lookup("COVIDASH_FIXTURE_PATH") {
            self.source.fixture_path = Some(path);
        }

        // Series overrides
        if let Some(floor) = lookup("COVIDASH_CASES_FLOOR").and_then(|s| s.parse().ok()) {
            self.series.cases_floor = floor;
        }
        if let Some(floor) = lookup("COVIDASH_DEATHS_FLOOR").and_then(|s| s.parse().ok()) {
            self.series.deaths_floor = floor;
        }

        // API overrides
        if let Some(host) = lookup("COVIDASH_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("COVIDASH_API_PORT").and_then(|s| s.parse().ok()) {
            self.api.port = port;
        }

        // Logging overrides
        if let Some(level) = lookup("COVIDASH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("COVIDASH_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Settings for the statistics client
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.source.base_url.clone(),
            request_timeout_ms: self.source.request_timeout_ms,
        }
    }

    /// Build the country source: the fixture file when configured,
    /// otherwise the HTTP client
    pub fn build_source(&self) -> Result<Arc<dyn CountrySource>, SourceError> {
        match &self.source.fixture_path {
            Some(path) => Ok(Arc::new(StaticSource::from_json_file(Path::new(path))?)),
            None => Ok(Arc::new(SourceClient::new(self.client_config())?)),
        }
    }

    /// Settings for the selection controller
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            thresholds: Thresholds {
                cases_floor: self.series.cases_floor,
                deaths_floor: self.series.deaths_floor,
            },
            flag_url_template: self.dashboard.flag_url_template.clone(),
            default_style: self.dashboard.default_style,
            ..ControllerConfig::default()
        }
    }

    /// Settings for the HTTP server
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.api.host.clone(),
            port: self.api.port,
            request_timeout_ms: self.api.request_timeout_secs * 1000,
            cors_origins: self.api.cors_origins.clone(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Covidash Configuration
#
# Environment variables override these settings:
# - COVIDASH_API_BASE_URL
# - COVIDASH_FIXTURE_PATH
# - COVIDASH_API_HOST
# - COVIDASH_API_PORT
# - COVIDASH_CASES_FLOOR
# - COVIDASH_DEATHS_FLOOR
# - COVIDASH_LOG_LEVEL
# - COVIDASH_LOG_FORMAT

[source]
# Base URL of the statistics API
base_url = "https://corona-api.com"

# Request timeout (ms)
request_timeout_ms = 10000

# Serve countries from a local JSON file instead of the API
# fixture_path = "./countries.json"

[series]
# A confirmed-cases value must exceed this to be recorded
cases_floor = 20

# A deaths value must exceed this to be recorded
deaths_floor = 1

[dashboard]
# Flag image URL; {code} is replaced by the ISO country code
flag_url_template = "https://www.countryflags.io/{code}/shiny/32.png"

# Chart style: line, bar, or area
default_style = "area"

# ISO codes to select on startup
initial_countries = []

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8082

# Allowed CORS origins (empty = any)
cors_origins = ["http://localhost:3000", "http://127.0.0.1:3000"]

# Request timeout in seconds
request_timeout_secs = 30

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/covidash/covidash.log"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.source.base_url, "https://corona-api.com");
        assert_eq!(config.series.cases_floor, 20);
        assert_eq!(config.series.deaths_floor, 1);
        assert_eq!(config.dashboard.default_style, ChartStyle::Area);
        assert_eq!(config.api.port, 8082);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.source.base_url, "https://corona-api.com");
        assert_eq!(config.series.cases_floor, 20);
        assert!(config.dashboard.initial_countries.is_empty());
        assert_eq!(config.api.cors_origins.len(), 2);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[series]\ncases_floor = 100\n\n[dashboard]\ndefault_style = \"bar\"\ninitial_countries = [\"IT\", \"ES\"]"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.series.cases_floor, 100);
        assert_eq!(config.series.deaths_floor, 1);
        assert_eq!(config.dashboard.default_style, ChartStyle::Bar);
        assert_eq!(config.dashboard.initial_countries, vec!["IT", "ES"]);
        assert_eq!(config.api.host, "0.0.0.0");
    }

    #[test]
    fn test_load_errors() {
        let err = Config::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[series\ncases_floor = ").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("COVIDASH_API_BASE_URL", "http://localhost:9000"),
            ("COVIDASH_API_PORT", "9999"),
            ("COVIDASH_CASES_FLOOR", "5"),
            ("COVIDASH_DEATHS_FLOOR", "not-a-number"),
            ("COVIDASH_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.source.base_url, "http://localhost:9000");
        assert_eq!(config.api.port, 9999);
        assert_eq!(config.series.cases_floor, 5);
        assert_eq!(config.series.deaths_floor, 1);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_derived_configs() {
        let mut config = Config::default();
        config.series.cases_floor = 50;
        config.api.request_timeout_secs = 5;

        assert_eq!(config.controller_config().thresholds.cases_floor, 50);
        assert_eq!(config.client_config().base_url, "https://corona-api.com");
        assert_eq!(config.server_config().request_timeout_ms, 5000);
        assert_eq!(config.server_config().addr(), "0.0.0.0:8082");
    }
}
