//! Portfolio definition: coins, target allocations, and allocation totals.
//!
//! A portfolio is a list of [`PortfolioCoin`]s. Each coin carries both a live
//! holding (`amount`, used by the rebalance view) and a USD `value` (used as
//! the starting position of a backtest), plus its [`TargetAllocation`].
//!
//! # Example
//!
//! ```
//! use coinfolio::portfolio::{PortfolioCoin, TotalsMode, portfolio_totals};
//!
//! let coins = [
//!     PortfolioCoin::with_value("BTC", 600.0, 60.0),
//!     PortfolioCoin::with_value("ETH", 400.0, 40.0),
//! ];
//! let totals = portfolio_totals(&coins, |_| None, TotalsMode::Backtest);
//! assert_eq!(totals.total_value, 1000.0);
//! assert_eq!(totals.percent_unallocated, 0.0);
//! assert!(totals.allocated_amounts_targets);
//! ```

pub mod metrics;

pub use metrics::profit_percentage;

use crate::types::Coin;

/// Desired share of a coin in the portfolio.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetAllocation {
    /// Drift (in percentage points) at which the live view flags a rebalance
    pub threshold: f64,
    /// Target share of total portfolio value, in percent (0..=100)
    pub percent: f64,
}

/// One coin of a portfolio.
///
/// Supplied wholesale to the engine and never mutated by it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortfolioCoin {
    pub coin: Coin,
    /// Units currently held (live mode)
    pub amount: f64,
    /// Starting USD value (backtest mode)
    pub value: f64,
    pub rebalance: TargetAllocation,
}

impl PortfolioCoin {
    /// A backtest coin: `value` USD at the first timestamp, `percent` target.
    pub fn with_value(coin: &str, value: f64, percent: f64) -> Self {
        Self {
            coin: Coin::new(coin),
            amount: 0.0,
            value,
            rebalance: TargetAllocation {
                threshold: 0.0,
                percent,
            },
        }
    }

    /// A live holding of `amount` units with a `percent` target and drift `threshold`.
    pub fn with_amount(coin: &str, amount: f64, percent: f64, threshold: f64) -> Self {
        Self {
            coin: Coin::new(coin),
            amount,
            value: 0.0,
            rebalance: TargetAllocation { threshold, percent },
        }
    }

    /// Target share as a fraction (e.g. 0.6 for 60%).
    #[inline]
    pub fn target_weight(&self) -> f64 {
        self.rebalance.percent / 100.0
    }
}

/// How [`portfolio_totals`] values each coin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TotalsMode {
    /// `price * amount`
    Live,
    /// The configured USD `value`
    Backtest,
}

/// Allocation summary over a whole portfolio.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortfolioTotals {
    pub total_value: f64,
    pub percent_allocated: f64,
    /// `100 - percent_allocated`; negative when over-allocated
    pub percent_unallocated: f64,
    /// False if any coin has no holding or no target percent
    pub allocated_amounts_targets: bool,
}

impl PortfolioTotals {
    /// Targets sum to exactly 100%.
    pub fn fully_allocated(&self) -> bool {
        (self.percent_unallocated).abs() < 1e-9
    }
}

/// Sum value and target percentages across a portfolio.
///
/// `price_of` supplies live prices; it is only consulted in
/// [`TotalsMode::Live`]. A coin without a price contributes no value.
pub fn portfolio_totals<F>(coins: &[PortfolioCoin], price_of: F, mode: TotalsMode) -> PortfolioTotals
where
    F: Fn(&Coin) -> Option<f64>,
{
    let mut total_value = 0.0;
    let mut percent_allocated = 0.0;
    let mut allocated_amounts_targets = true;

    for c in coins {
        let held = match mode {
            TotalsMode::Backtest => {
                total_value += c.value;
                c.value
            }
            TotalsMode::Live => {
                total_value += price_of(&c.coin).unwrap_or(0.0) * c.amount;
                c.amount
            }
        };
        if held == 0.0 || c.rebalance.percent == 0.0 {
            allocated_amounts_targets = false;
        }
        percent_allocated += c.rebalance.percent;
    }

    PortfolioTotals {
        total_value,
        percent_allocated,
        percent_unallocated: 100.0 - percent_allocated,
        allocated_amounts_targets,
    }
}
