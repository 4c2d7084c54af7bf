//! Ticketwatch CLI - get notified when a queue ticket is about to be called

mod commands;
mod render;
mod settings;
mod telemetry;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use settings::LogFormat;

#[derive(Parser)]
#[command(name = "ticketwatch")]
#[command(about = "Watch a ticket queue and get notified before your number is called", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file
    #[arg(long, env = "TICKETWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format (overrides the config file)
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the number currently served and how many are waiting
    Status {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Watch a ticket number until it is reached
    Watch {
        /// Your ticket number
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        number: i64,

        /// Key identifying who is watching
        #[arg(short, long, env = "USER", default_value = "local")]
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings =
        settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(format) = cli.log_format {
        settings.log.format = format;
    }
    settings.validate().context("Invalid configuration")?;

    let _log_guard = telemetry::init_logging(&settings.log);
    debug!(
        version = ticketwatch_core::VERSION,
        feed = %settings.feed.base_url,
        "Ticketwatch starting"
    );

    match cli.command {
        Commands::Status { json } => commands::status(&settings, json).await,
        Commands::Watch { number, user } => commands::watch(&settings, number, user).await,
    }
}
