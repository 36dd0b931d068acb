//! Error types for the command-line runner.

use std::path::PathBuf;

/// All errors that can occur while running a command.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to read price file {path}: {source}")]
    PriceRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse price JSON: {0}")]
    PriceParse(#[from] serde_json::Error),

    #[error("backtest failed: {0}")]
    Engine(#[from] coinfolio::Error),

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
