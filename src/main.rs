mod api;
mod cli;
mod error;
mod models;

use clap::Parser;
use cli::{App, Cli, Commands, ForecastArgs};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Select};
use error::{AppError, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!("Initializing pollen forecast CLI...");

    let app = match App::new() {
        Ok(app) => {
            info!("Application initialized successfully.");
            app
        },
        Err(e) => {
            error!("Failed to initialize application: {:?}", e);
            println!(
                "{}",
                "Error: Failed to initialize application. Check logs.".red()
            );
            return Err(e);
        },
    };

    // One-shot mode when a subcommand is given on the command line.
    if std::env::args().len() > 1 {
        let cli = Cli::parse();
        let result = app.run_command(cli.command).await;
        if let Err(e) = &result {
            surface_error(e);
        }
        return result;
    }

    println!("{}", "Welcome to the Pollenprognos CLI!".cyan().bold());

    // Main interactive loop
    loop {
        let options = &[
            "List pollen types",
            "List regions",
            "Show current forecast",
            "Show forecast for a region",
            "Exit",
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("What would you like to do?")
            .items(options)
            .default(0)
            .interact_opt()? // Handles cancellation (e.g. Ctrl+C)
            .unwrap_or(options.len() - 1); // Default to Exit if cancelled

        println!("\n---\n");

        let command_result = match selection {
            0 => app.run_command(Commands::PollenTypes).await,
            1 => app.run_command(Commands::Regions).await,
            2 => {
                app.run_command(Commands::Forecast(ForecastArgs { region: None }))
                    .await
            },
            3 => match app.regions().await {
                Ok(regions) => match cli::prompt_region(&regions) {
                    Ok(region) => {
                        app.run_command(Commands::Forecast(ForecastArgs {
                            region: Some(region),
                        }))
                        .await
                    },
                    Err(e) => {
                        println!("{} {}", "Failed to get region:".red(), e);
                        continue;
                    },
                },
                Err(e) => Err(e),
            },
            4 => {
                println!("{}", "Exiting application. Goodbye!".green());
                break;
            },
            _ => unreachable!(),
        };

        if let Err(e) = command_result {
            surface_error(&e);
        }

        println!("\n---\n");
    }

    Ok(())
}

/// The host decides how a failed fetch is surfaced. An API failure means the
/// pollen data is temporarily unavailable; anything else is a real fault.
fn surface_error(e: &AppError) {
    error!("Command execution failed: {:?}", e);
    match e {
        AppError::Api(api_err) => println!(
            "{} {}",
            "Pollen data temporarily unavailable:".yellow(),
            api_err.to_string().yellow()
        ),
        other => println!(
            "{} {}",
            "Error executing command:".red(),
            other.to_string().red()
        ),
    }
}
