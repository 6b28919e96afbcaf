//! Trellis CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use trellis::cli::{commands, Cli, Commands};
use trellis::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| {
            format!("trellis={},tower_http={}", log_level, log_level)
        })))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match cli.command {
        Commands::Serve { host, port } => {
            commands::run_serve(host, port, settings).await?;
        }

        Commands::Ask { question, model } => {
            commands::run_ask(&question, model, settings).await?;
        }

        Commands::Browse { question, model } => {
            commands::run_browse(&question, model, settings).await?;
        }

        Commands::Evals {
            dataset,
            save,
            concurrency,
        } => {
            commands::run_evals(dataset, save, concurrency, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, cli.config.as_deref()).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, cli.config.as_deref(), settings)?;
        }
    }

    Ok(())
}
