use crate::api::PollenApi;
use crate::error::{AppError, Result};
use crate::models::{severity_ordinal, City, Forecast, ForecastTable, SEVERITY_MAX};
use chrono::DateTime;
use clap::{Args, Parser, Subcommand};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use dialoguer::{theme::ColorfulTheme, FuzzySelect};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::env;
use std::time::Duration;
use tracing::info;

/// Environment variable overriding the API base URL.
pub const ENV_BASE_URL: &str = "POLLENPROGNOS_URL";

/// Environment variable selecting the default forecast region.
pub const ENV_REGION: &str = "POLLENPROGNOS_REGION";

/// CLI tool for Swedish pollen forecasts
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the pollen type catalog
    PollenTypes,

    /// List the forecast regions
    Regions,

    /// Show the current pollen forecast for a region
    Forecast(ForecastArgs),
}

#[derive(Args, Debug)]
pub struct ForecastArgs {
    /// Region id (falls back to POLLENPROGNOS_REGION, then the first region)
    #[arg(short, long)]
    pub region: Option<String>,
}

/// CLI application
pub struct App {
    client: Client,
    base_url: Option<String>,
    default_region: Option<String>,
}

impl App {
    /// Create a new CLI application
    pub fn new() -> Result<Self> {
        // Load environment variables
        dotenv::dotenv().ok();

        let base_url = match env::var(ENV_BASE_URL) {
            Ok(url) => Some(url),
            Err(env::VarError::NotPresent) => None,
            Err(e) => return Err(AppError::Env(e)),
        };
        let default_region = match env::var(ENV_REGION) {
            Ok(region) => Some(region),
            Err(env::VarError::NotPresent) => None,
            Err(e) => return Err(AppError::Env(e)),
        };

        if let Some(url) = base_url.as_deref() {
            info!("Using pollen API at {}", url);
        }

        Ok(Self {
            // The reqwest client is created once here and cloned into each
            // API client so the connection pool stays with the host.
            client: Client::new(),
            base_url,
            default_region,
        })
    }

    #[cfg(test)]
    fn with_base_url(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: Some(base_url.to_string()),
            default_region: None,
        }
    }

    /// A fresh API client for one command invocation. The caches, including
    /// the region-agnostic forecast table, live and die with the instance;
    /// sharing one client across commands would serve the first region's
    /// readings under a later region's name.
    fn api(&self) -> PollenApi {
        match self.base_url.as_deref() {
            Some(url) => PollenApi::new_with_base_url(self.client.clone(), url),
            None => PollenApi::new(self.client.clone()),
        }
    }

    /// Run one CLI command
    pub async fn run_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::PollenTypes => self.list_pollen_types().await,
            Commands::Regions => self.list_regions().await,
            Commands::Forecast(args) => self.show_forecast(args.region.as_deref()).await,
        }
    }

    /// The region catalog, for interactive selection.
    pub async fn regions(&self) -> Result<Vec<City>> {
        Ok(self.api().get_cities().await?.to_vec())
    }

    async fn list_pollen_types(&self) -> Result<()> {
        let api = self.api();
        let bar = spinner("Fetching pollen types...")?;
        let result = api.get_pollen_types().await;
        bar.finish_and_clear();
        let types = result?;

        println!("{}", "Known pollen types".cyan().bold());
        render_id_name_table(types.iter().map(|t| (t.id.as_str(), t.name.as_str())));

        Ok(())
    }

    async fn list_regions(&self) -> Result<()> {
        let api = self.api();
        let bar = spinner("Fetching regions...")?;
        let result = api.get_cities().await;
        bar.finish_and_clear();
        let cities = result?;

        println!("{}", "Forecast regions".cyan().bold());
        render_id_name_table(cities.iter().map(|c| (c.region_id.as_str(), c.name.as_str())));

        Ok(())
    }

    async fn show_forecast(&self, region: Option<&str>) -> Result<()> {
        let api = self.api();
        let region = region
            .map(str::to_string)
            .or_else(|| self.default_region.clone());

        let bar = spinner("Fetching forecast...")?;
        let result: Result<(City, ForecastTable)> = async {
            let table = api.get_forecast(region.as_deref()).await?.clone();
            let cities = api.get_cities().await?;
            // Resolve the display name for the queried region. An id the
            // catalog does not know is still queried as-is.
            let city = match region.as_deref() {
                Some(id) => cities
                    .iter()
                    .find(|c| c.region_id == id)
                    .cloned()
                    .unwrap_or_else(|| City::new(id, id)),
                None => cities
                    .first()
                    .cloned()
                    .unwrap_or_else(|| City::new("", "unknown region")),
            };
            Ok((city, table))
        }
        .await;
        bar.finish_and_clear();
        let (city, table) = result?;

        let forecast = Forecast::from_table(city, &table);

        println!(
            "{}",
            format!("Pollen forecast for {}", forecast.city.name)
                .cyan()
                .bold()
        );

        if table.is_empty() {
            println!(
                "{}",
                "No pollen readings reported for this region right now.".yellow()
            );
            return Ok(());
        }
        let mut out = Table::new();
        out.load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Pollen", "Day", "Level", "Severity"]);
        for pollen in &forecast.pollen_levels {
            out.add_row(vec![
                pollen.pollen_type.name.clone(),
                format_day(&pollen.time),
                pollen.level.clone(),
                severity_cell(&pollen.level),
            ]);
        }
        println!("{out}");

        Ok(())
    }
}

/// Prompt the user to pick a region from the catalog, returning its id.
pub fn prompt_region(regions: &[City]) -> Result<String> {
    if regions.is_empty() {
        return Err(AppError::Cli(
            "No regions available to choose from".to_string(),
        ));
    }
    let names: Vec<&str> = regions.iter().map(|c| c.name.as_str()).collect();
    let selection = FuzzySelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Pick a region")
        .items(&names)
        .default(0)
        .interact()?;
    Ok(regions[selection].region_id.clone())
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar.set_message(message.to_string());
    Ok(bar)
}

fn render_id_name_table<'a>(rows: impl Iterator<Item = (&'a str, &'a str)>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Id", "Name"]);
    for (id, name) in rows {
        table.add_row(vec![id, name]);
    }
    println!("{table}");
}

/// Severity ordinal for display; codes outside the fixed scale render as `?`.
fn severity_cell(level: &str) -> String {
    match severity_ordinal(level) {
        Some(ordinal) => format!("{}/{}", ordinal, SEVERITY_MAX),
        None => "?".to_string(),
    }
}

/// Forecast timestamps are RFC 3339 when well-formed; anything else is shown
/// verbatim.
fn format_day(time: &str) -> String {
    DateTime::parse_from_rfc3339(time)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| time.to_string())
}
