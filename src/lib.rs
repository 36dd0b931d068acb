//! # coinfolio
//!
//! A deterministic backtesting engine for crypto portfolios.
//!
//! Given a portfolio of coins with target allocations, a date-aligned price
//! table and a set of strategy parameters, [`backtest`] simulates side by side:
//!
//! - **Buy and hold**: the initial amounts, untouched
//! - **DCA**: fixed-dollar contributions split by target percentage
//! - **Period rebalancing**: a full snap to target every `p` steps
//! - **Threshold rebalancing**: a full snap once a coin drifts `t` points
//! - **DCA + rebalancing**: both at once
//!
//! and reduces every resulting series to its value extrema.
//!
//! ## Quick Start
//!
//! ```
//! use coinfolio::{
//!     BacktestConfig, Coin, PortfolioCoin, PriceTableBuilder, StrategyParams, Variant, backtest,
//! };
//! use coinfolio::strategy::RebalanceParams;
//!
//! const DAY: i64 = 86_400_000;
//!
//! let prices = PriceTableBuilder::new([Coin::new("BTC"), Coin::new("ETH")])
//!     .series(&Coin::new("BTC"), &[(0, 100.0), (DAY, 200.0), (2 * DAY, 200.0)])
//!     .series(&Coin::new("ETH"), &[(0, 100.0), (DAY, 50.0), (2 * DAY, 50.0)])
//!     .build();
//!
//! let coins = [
//!     PortfolioCoin::with_value("BTC", 600.0, 60.0),
//!     PortfolioCoin::with_value("ETH", 400.0, 40.0),
//! ];
//!
//! let params = StrategyParams {
//!     rebalance: RebalanceParams { periods: vec![1], thresholds: vec![] },
//!     ..Default::default()
//! };
//! let results = backtest(&BacktestConfig::new(0, 2 * DAY, params), &prices, &coins)?;
//!
//! // BTC doubled and ETH halved: 1200 + 200
//! let hold = results.final_total(Variant::BuyAndHold).unwrap();
//! assert!((hold.value - 1400.0).abs() < 1e-9);
//!
//! // The daily rebalance put BTC back at 60% of 1400
//! let (_, btc) = results
//!     .coin_values(&Coin::new("BTC"), Variant::Period(1))
//!     .unwrap()
//!     .nth(1)
//!     .unwrap();
//! assert!((btc.coin_value - 840.0).abs() < 1e-9);
//!
//! let stats = results.stats.portfolio.get(Variant::BuyAndHold).unwrap();
//! assert_eq!(stats.max.timestamp, DAY);
//! # Ok::<(), coinfolio::Error>(())
//! ```
//!
//! ## Strategy variants
//!
//! | Variant | Present when |
//! |---------|--------------|
//! | `BuyAndHold` | always |
//! | `Dca` | `dca.amount > 0` |
//! | `Period(p)` | for each configured period |
//! | `Threshold(t)` | for each configured threshold |
//! | `PeriodDca(p)`, `ThresholdDca(t)` | both of the above |
//!
//! Every per-step record stores one value per variant in this order; see
//! [`VariantSet`].
//!
//! ## Live rebalancing
//!
//! The same arithmetic drives a live view of an actual holding:
//!
//! ```
//! use coinfolio::portfolio::TargetAllocation;
//! use coinfolio::rebalance::{Direction, rebalance_amounts};
//!
//! let target = TargetAllocation { threshold: 5.0, percent: 50.0 };
//! // 0.5 BTC at 40k in a 30k portfolio
//! let plan = rebalance_amounts(&target, 40_000.0, 0.5, 30_000.0);
//! assert!(plan.reached_threshold);
//! assert_eq!(plan.to_balance_direction, Direction::Sell);
//! assert_eq!(plan.to_balance_amount, Some(-0.125));
//! ```
//!
//! ## Risk analysis
//!
//! [`risk_analysis::risk_analysis`] turns a single price history into monthly
//! or weekly performance rows with a Kelly Criterion summary.
//!
//! ## Features
//!
//! - `serde`: `Serialize`/`Deserialize` on all public data types
//! - `parallel`: [`sweep`](crate::sweep) runs many backtests on a rayon pool

pub mod backtest;
mod error;
pub mod portfolio;
pub mod price_table;
pub mod rebalance;
pub mod risk_analysis;
pub mod stats;
pub mod strategy;
#[cfg(feature = "parallel")]
pub mod sweep;
mod types;
pub mod window;

// Re-export public API
pub use backtest::{BacktestConfig, BacktestResults, backtest};
pub use error::{Error, Result};
pub use portfolio::{PortfolioCoin, TargetAllocation, profit_percentage};
pub use price_table::{PriceTable, PriceTableBuilder};
pub use risk_analysis::{RiskAnalysis, RiskPeriod, risk_analysis};
pub use stats::BacktestStats;
pub use strategy::{DcaParams, RebalanceParams, StrategyParams, Variant, VariantSet};
pub use types::{Coin, MS_PER_DAY, MS_PER_HOUR, Timestamp, to_datetime};
pub use window::BacktestWindow;
