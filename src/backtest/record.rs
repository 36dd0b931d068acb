//! Per-step result records.
//!
//! Every record holds one entry per strategy variant, in
//! [`VariantSet`](crate::strategy::VariantSet) slot order.

use crate::stats::BacktestStats;
use crate::strategy::{StrategyParams, Variant, VariantSet};
use crate::types::{Coin, Timestamp};

/// One coin's position inside one strategy variant.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Holding {
    /// Units held
    pub amount: f64,
    /// `amount * price` at this step
    pub coin_value: f64,
    /// Profit relative to the coin's initial value
    pub profit_pc: f64,
    /// Drift from target in percentage points (rebalancing variants only)
    pub difference_pc: f64,
}

impl Holding {
    pub(crate) fn new(amount: f64, coin_value: f64) -> Self {
        Self {
            amount,
            coin_value,
            profit_pc: 0.0,
            difference_pc: 0.0,
        }
    }
}

/// A coin that snapped to target under a threshold rule.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalancedCoin {
    pub coin: Coin,
    /// Drift that triggered the rebalance
    pub difference_pc: f64,
}

/// Aggregate value of one strategy variant.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortfolioTotal {
    /// Sum of the variant's coin values
    pub value: f64,
    /// Profit relative to the portfolio's initial value
    pub profit_pc: f64,
    /// Coins rebalanced at this step (threshold variants only)
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub rebalanced: Vec<RebalancedCoin>,
}

/// All variants of one coin at one timestamp.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoinRecord {
    pub timestamp: Timestamp,
    pub holdings: Vec<Holding>,
}

/// All variants of the whole portfolio at one timestamp.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortfolioRecord {
    pub timestamp: Timestamp,
    pub totals: Vec<PortfolioTotal>,
}

/// A coin's full result series.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoinSeries {
    pub coin: Coin,
    /// Initial price times initial amount
    pub initial_value: f64,
    pub records: Vec<CoinRecord>,
}

/// Output of [`backtest`](super::backtest).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BacktestResults {
    pub from: Timestamp,
    pub to: Timestamp,
    pub params: StrategyParams,
    pub variants: VariantSet,
    /// Portfolio value at the first timestamp
    pub initial_value: f64,
    /// Steps spanned by one `rebalance_period_hours` window (informational)
    pub rebalance_period_steps: f64,
    /// Per coin, in portfolio order
    pub coins: Vec<CoinSeries>,
    pub portfolio: Vec<PortfolioRecord>,
    pub stats: BacktestStats,
}

impl BacktestResults {
    /// Series for `coin`.
    pub fn coin(&self, coin: &Coin) -> Option<&CoinSeries> {
        self.coins.iter().find(|s| &s.coin == coin)
    }

    /// Number of processed timestamps.
    pub fn len(&self) -> usize {
        self.portfolio.len()
    }

    pub fn is_empty(&self) -> bool {
        self.portfolio.is_empty()
    }

    /// Portfolio totals of one variant over time.
    pub fn portfolio_values(
        &self,
        variant: Variant,
    ) -> Option<impl Iterator<Item = (Timestamp, &PortfolioTotal)> + '_> {
        let slot = self.variants.slot(variant)?;
        Some(self.portfolio.iter().map(move |r| (r.timestamp, &r.totals[slot])))
    }

    /// One coin's holdings under one variant over time.
    pub fn coin_values(
        &self,
        coin: &Coin,
        variant: Variant,
    ) -> Option<impl Iterator<Item = (Timestamp, &Holding)> + '_> {
        let slot = self.variants.slot(variant)?;
        let series = self.coin(coin)?;
        Some(series.records.iter().map(move |r| (r.timestamp, &r.holdings[slot])))
    }

    /// Portfolio total of `variant` at the last timestamp.
    pub fn final_total(&self, variant: Variant) -> Option<&PortfolioTotal> {
        let slot = self.variants.slot(variant)?;
        self.portfolio.last().map(|r| &r.totals[slot])
    }
}
