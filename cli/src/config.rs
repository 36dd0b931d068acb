//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use coinfolio::portfolio::{PortfolioTotals, TotalsMode, portfolio_totals};
use coinfolio::{
    BacktestConfig, BacktestWindow, Coin, DcaParams, PortfolioCoin, RebalanceParams,
    StrategyParams, TargetAllocation,
};

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub backtest: BacktestSection,
    #[serde(default)]
    pub rebalance: RebalanceSection,
    #[serde(default)]
    pub dca: DcaSection,
    pub coins: Vec<CoinConfig>,
    #[serde(default)]
    pub prices: PricesSection,
    /// Directory of the config file; relative paths resolve against it
    #[serde(skip)]
    root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BacktestSection {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    #[serde(default = "default_rebalance_period_hours")]
    pub rebalance_period_hours: f64,
}

fn default_rebalance_period_hours() -> f64 {
    168.0
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RebalanceSection {
    #[serde(default)]
    pub periods: Vec<u32>,
    #[serde(default)]
    pub thresholds: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DcaSection {
    #[serde(default)]
    pub amount: f64,
    #[serde(default = "default_dca_period")]
    pub period: u32,
}

impl Default for DcaSection {
    fn default() -> Self {
        Self {
            amount: 0.0,
            period: default_dca_period(),
        }
    }
}

fn default_dca_period() -> u32 {
    1
}

/// One portfolio coin.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinConfig {
    pub coin: String,
    /// Starting USD value for backtests
    #[serde(default)]
    pub value: f64,
    /// Target allocation, percent
    pub percent: f64,
    /// Drift that flags a live rebalance, percentage points
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Units currently held, for `plan`
    #[serde(default)]
    pub amount: f64,
}

fn default_threshold() -> f64 {
    5.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct PricesSection {
    #[serde(default = "default_prices_dir")]
    pub dir: String,
}

impl Default for PricesSection {
    fn default() -> Self {
        Self {
            dir: default_prices_dir(),
        }
    }
}

fn default_prices_dir() -> String {
    "prices".into()
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config = Self::from_toml(&contents)?;
        config.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    /// Parse and validate from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        if self.coins.is_empty() {
            return Err(Error::Config("at least one [[coins]] entry is required".into()));
        }
        let mut seen = rustc_hash::FxHashSet::default();
        for c in &self.coins {
            let id = c.coin.trim().to_uppercase();
            if id.is_empty() {
                return Err(Error::Config("empty coin identifier".into()));
            }
            if !seen.insert(id) {
                return Err(Error::Config(format!("duplicate coin: {}", c.coin)));
            }
            if !c.value.is_finite() || c.value < 0.0 {
                return Err(Error::Config(format!("value for {} must be >= 0", c.coin)));
            }
            if !(0.0..=100.0).contains(&c.percent) {
                return Err(Error::Config(format!(
                    "percent for {} must be in [0, 100]",
                    c.coin
                )));
            }
            if c.threshold < 0.0 || c.amount < 0.0 {
                return Err(Error::Config(format!(
                    "threshold and amount for {} must be >= 0",
                    c.coin
                )));
            }
        }
        if self.backtest.rebalance_period_hours <= 0.0 {
            return Err(Error::Config("rebalance_period_hours must be > 0".into()));
        }
        self.strategy_params()
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(())
    }

    /// Allocation summary of the configured starting values.
    ///
    /// Logs a warning when the targets do not add up to 100%.
    pub fn allocation(&self) -> PortfolioTotals {
        let totals = portfolio_totals(&self.portfolio_coins(), |_| None, TotalsMode::Backtest);
        if !totals.fully_allocated() {
            log::warn!(
                "target allocations sum to {:.2}% ({:+.2}% unallocated)",
                totals.percent_allocated,
                totals.percent_unallocated
            );
        }
        totals
    }

    /// Coins as the engine sees them. Identifiers are upper-cased.
    pub fn portfolio_coins(&self) -> Vec<PortfolioCoin> {
        self.coins
            .iter()
            .map(|c| PortfolioCoin {
                coin: Coin::from(c.coin.trim().to_uppercase()),
                amount: c.amount,
                value: c.value,
                rebalance: TargetAllocation {
                    threshold: c.threshold,
                    percent: c.percent,
                },
            })
            .collect()
    }

    pub fn strategy_params(&self) -> StrategyParams {
        StrategyParams {
            rebalance: RebalanceParams {
                periods: self.rebalance.periods.clone(),
                thresholds: self.rebalance.thresholds.clone(),
            },
            dca: DcaParams {
                amount: self.dca.amount,
                period: self.dca.period,
            },
        }
    }

    /// The configured window, stretched to the minimum span if needed.
    pub fn window(&self) -> BacktestWindow {
        let window = BacktestWindow::new(self.backtest.from, self.backtest.to);
        if window.from() != self.backtest.from {
            log::warn!(
                "backtest window shorter than {} days; starting at {} instead",
                coinfolio::window::MIN_WINDOW_DAYS,
                window.from().format("%Y-%m-%d")
            );
        }
        window
    }

    pub fn backtest_config(&self) -> BacktestConfig {
        let (from, to) = self.window().as_millis();
        BacktestConfig {
            from,
            to,
            params: self.strategy_params(),
            rebalance_period_hours: self.backtest.rebalance_period_hours,
        }
    }

    /// Directory holding `<COIN>.json` price histories.
    pub fn prices_dir(&self) -> PathBuf {
        self.root.join(&self.prices.dir)
    }
}
