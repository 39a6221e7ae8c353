//! Covidash CLI
//!
//! Command-line interface for Covidash:
//! - Browse the country directory
//! - Render cases and deaths charts locally for a set of countries
//! - Drive the selection of a running server
//! - Check server and upstream status

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use covidash::config::Config;
use covidash::dashboard::{DashboardStatus, SelectionController};
use covidash::series::{ChartPayload, ChartStyle, Metric};
use covidash::source::SourceClient;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "covidash")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "COVID-19 country comparison dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8082", global = true)]
    pub api_url: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Table, global = true)]
    pub format: Format,

    /// Read country data from a JSON fixture instead of the statistics API
    #[arg(long, global = true)]
    pub fixture: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Format {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List countries known to the server
    Countries,

    /// Fetch countries directly and print their charts
    Show {
        /// ISO country codes (e.g. IT ES)
        #[arg(required = true)]
        codes: Vec<String>,
        /// Chart style (line, bar, area)
        #[arg(short, long, default_value = "area")]
        style: ChartStyle,
        /// Only one metric (cases, deaths)
        #[arg(short, long)]
        metric: Option<Metric>,
    },

    /// Add countries to the server's selection by ISO code
    Select {
        #[arg(required = true)]
        codes: Vec<String>,
    },

    /// Remove a country from the server's selection
    Deselect {
        /// Country name as listed by `countries`
        name: String,
    },

    /// Show the server's dashboard state
    Status,

    /// Check that the statistics API answers
    Ping,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Countries => {
            let response = client
                .get(format!("{}/api/v1/countries", cli.api_url))
                .send()
                .await
                .with_context(|| unreachable_server(&cli.api_url))?;
            let data: serde_json::Value = expect_success(response).await?.json().await?;

            match cli.format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&data)?),
                Format::Csv => {
                    println!("name,code");
                    for country in data["countries"].as_array().into_iter().flatten() {
                        println!(
                            "{},{}",
                            country["name"].as_str().unwrap_or_default(),
                            country["code"].as_str().unwrap_or_default()
                        );
                    }
                }
                Format::Table => {
                    println!("{:<32} {}", "Name", "Code");
                    println!("{}", "-".repeat(38));
                    for country in data["countries"].as_array().into_iter().flatten() {
                        println!(
                            "{:<32} {}",
                            country["name"].as_str().unwrap_or("-"),
                            country["code"].as_str().unwrap_or("-")
                        );
                    }
                }
            }
        }

        Commands::Show {
            codes,
            style,
            metric,
        } => {
            let mut config = Config::load_default();
            if let Some(path) = &cli.fixture {
                config.source.fixture_path = Some(path.display().to_string());
            }

            let source = config.build_source()?;
            let (controller, task) = SelectionController::spawn(source, config.controller_config());
            controller
                .load_directory()
                .await
                .context("Failed to load the country directory")?;

            for code in &codes {
                if let Err(e) = controller.select_by_code(code).await {
                    eprintln!("Skipping {}: {}", code, e);
                }
            }

            let snapshot = controller.snapshot();
            let metrics = match metric {
                Some(m) => vec![m],
                None => Metric::ALL.to_vec(),
            };
            let charts: Vec<ChartPayload> = metrics
                .into_iter()
                .map(|m| snapshot.chart_with_style(m, style))
                .collect();
            print_charts(&charts, cli.format)?;

            drop(controller);
            task.await?;
        }

        Commands::Select { codes } => {
            for code in codes {
                let response = client
                    .post(format!("{}/api/v1/countries/{}/select", cli.api_url, code))
                    .send()
                    .await
                    .with_context(|| unreachable_server(&cli.api_url))?;
                match expect_success(response).await {
                    Ok(_) => println!("Selected {}", code),
                    Err(e) => eprintln!("{}: {}", code, e),
                }
            }
        }

        Commands::Deselect { name } => {
            let response = client
                .delete(format!(
                    "{}/api/v1/selection/{}",
                    cli.api_url,
                    urlencoding::encode(&name)
                ))
                .send()
                .await
                .with_context(|| unreachable_server(&cli.api_url))?;
            expect_success(response).await?;
            println!("Removed {}", name);
        }

        Commands::Status => {
            let response = client
                .get(format!("{}/api/v1/state", cli.api_url))
                .send()
                .await
                .with_context(|| unreachable_server(&cli.api_url))?;
            let status: DashboardStatus = expect_success(response).await?.json().await?;

            match cli.format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&status)?),
                _ => print_status(&status),
            }
        }

        Commands::Ping => {
            let mut config = Config::load_default();
            config.source.fixture_path = None;
            let source = SourceClient::new(config.client_config())?;
            source
                .health_check()
                .await
                .with_context(|| format!("Statistics API at {} is not reachable", config.source.base_url))?;
            println!("Statistics API at {} is up", config.source.base_url);
        }

        Commands::Config { output } => {
            let config = covidash::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", config),
            }
        }
    }

    Ok(())
}

fn unreachable_server(api_url: &str) -> String {
    format!(
        "Cannot connect to Covidash API at {} (start it with `cargo run --bin covidash`)",
        api_url
    )
}

async fn expect_success(response: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    bail!("Request failed ({}): {}", status, text)
}

fn print_charts(charts: &[ChartPayload], format: Format) -> anyhow::Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(charts)?),
        Format::Csv => {
            for chart in charts {
                println!("# {}", chart.title);
                print!("{}", chart.to_csv()?);
            }
        }
        Format::Table => {
            for chart in charts {
                println!("{}", chart.render_table());
            }
        }
    }
    Ok(())
}

fn print_status(status: &DashboardStatus) {
    println!("Covidash v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Countries known: {}", status.countries_known);
    if status.selected.is_empty() {
        println!("Selected:        (none)");
    } else {
        println!("Selected:        {}", status.selected.join(", "));
    }
    if !status.pending.is_empty() {
        println!("Fetching:        {}", status.pending.join(", "));
    }
    println!("Chart style:     {}", status.chart_style.label());
    println!("Dates plotted:   {} cases, {} deaths", status.case_dates, status.death_dates);
    println!("State version:   {}", status.version);
    if let Some(error) = &status.last_error {
        println!();
        println!("Last error: {}", error);
    }
}
