//! Parallel parameter sweep over strategy configurations.

use rayon::prelude::*;

use crate::backtest::{BacktestConfig, BacktestResults, backtest};
use crate::error::Result;
use crate::portfolio::PortfolioCoin;
use crate::price_table::PriceTable;

/// Run one backtest per configuration in parallel.
///
/// Every run owns its state; only the price table and coins are shared, read
/// only. Results come back in the order of `configs`.
///
/// # Example
///
/// ```
/// use coinfolio::{BacktestConfig, PortfolioCoin, PriceTableBuilder, StrategyParams, Coin};
/// use coinfolio::strategy::RebalanceParams;
///
/// let prices = PriceTableBuilder::new([Coin::new("BTC")])
///     .series(&Coin::new("BTC"), &[(0, 1.0), (86_400_000, 2.0)])
///     .build();
/// let coins = [PortfolioCoin::with_value("BTC", 100.0, 100.0)];
///
/// let configs: Vec<BacktestConfig> = [1, 7, 14]
///     .into_iter()
///     .map(|p| {
///         let params = StrategyParams {
///             rebalance: RebalanceParams { periods: vec![p], thresholds: vec![] },
///             ..Default::default()
///         };
///         BacktestConfig::new(0, 86_400_000, params)
///     })
///     .collect();
///
/// let results = coinfolio::sweep::sweep(&configs, &prices, &coins);
/// assert_eq!(results.len(), 3);
/// assert!(results.iter().all(|r| r.is_ok()));
/// ```
pub fn sweep(
    configs: &[BacktestConfig],
    prices: &PriceTable,
    coins: &[PortfolioCoin],
) -> Vec<Result<BacktestResults>> {
    log::debug!("sweep: {} configurations", configs.len());
    configs
        .par_iter()
        .map(|config| backtest(config, prices, coins))
        .collect()
}
