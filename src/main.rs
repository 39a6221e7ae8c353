//! Covidash API Server
//!
//! Run with: cargo run --bin covidash
//!
//! Configuration is read from `~/.config/covidash/config.toml`,
//! `/etc/covidash/config.toml` or `./config.toml`, then overridden by
//! `COVIDASH_*` environment variables. `RUST_LOG` takes precedence over
//! the configured log level.

use covidash::api::{serve, AppState};
use covidash::config::{Config, LoggingConfig};
use covidash::dashboard::SelectionController;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_default();
    init_tracing(&config.logging)?;

    tracing::info!("Starting Covidash API server v{}", env!("CARGO_PKG_VERSION"));

    let source = config.build_source()?;
    match &config.source.fixture_path {
        Some(path) => tracing::info!("Serving fixture data from {}", path),
        None => tracing::info!("Statistics API: {}", config.source.base_url),
    }

    let (controller, controller_task) =
        SelectionController::spawn(source, config.controller_config());

    // The server still starts without a directory; readiness reports it.
    match controller.load_directory().await {
        Ok(count) => tracing::info!("Loaded {} countries", count),
        Err(e) => tracing::warn!(
            "Country directory unavailable: {} (retry with POST /api/v1/countries/reload)",
            e
        ),
    }

    for code in &config.dashboard.initial_countries {
        match controller.select_by_code(code).await {
            Ok(outcome) => tracing::info!(code = %code, ?outcome, "Initial country selected"),
            Err(e) => tracing::warn!(code = %code, error = %e, "Initial country not selected"),
        }
    }

    let server_config = config.server_config();
    let state = AppState::new(controller, server_config.clone());
    serve(state, &server_config).await?;

    controller_task.abort();
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("covidash={},tower_http=debug", logging.level))
    });

    let writer = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(writer))
            .init();
    }
    Ok(())
}
