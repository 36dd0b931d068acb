//! CLI entry point for coinfolio.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use coinfolio::RiskPeriod;
use coinfolio_cli::commands;
use coinfolio_cli::config::Config;
use coinfolio_cli::error::Error;

#[derive(Parser)]
#[command(name = "coinfolio")]
#[command(about = "Backtest rebalancing and DCA strategies over historical crypto prices")]
#[command(version)]
struct Cli {
    /// Path to coinfolio.toml
    #[arg(long, default_value = "coinfolio.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the configured backtest
    Run {
        /// Write the full results as JSON instead of printing a summary
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Show the trades that bring current holdings back to target
    Plan {
        /// JSON map of coin to spot price
        prices: PathBuf,
    },

    /// Monthly or weekly performance of a single price history
    Risk {
        /// Price history JSON
        history: PathBuf,

        /// monthly or weekly
        #[arg(long, default_value = "monthly")]
        period: RiskPeriod,
    },
}

fn load_config(path: &Path) -> Config {
    match Config::load(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run { json } => {
            let config = load_config(&cli.config);
            commands::run_backtest(&config, json.as_deref())
        }
        Command::Plan { prices } => {
            let config = load_config(&cli.config);
            commands::run_plan(&config, &prices)
        }
        Command::Risk { history, period } => commands::run_risk(&history, period),
    };

    if let Err(e) = result {
        match &e {
            Error::Engine(inner) => {
                eprintln!("Error: {inner}");
                process::exit(2);
            }
            _ => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }
}
