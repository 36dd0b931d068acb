//! The simulation engine.
//!
//! [`backtest`] walks a [`PriceTable`] once, in ascending timestamp order, and
//! advances every strategy variant of a [`VariantSet`] side by side. Each step:
//!
//! 1. Marks every holding to market.
//! 2. Adds the DCA contribution to DCA-backed variants when one is due.
//!    A coin receives `dca.amount * target_percent / 100` USD worth of units.
//! 3. Runs the variant's rebalance rule against the variant's own running
//!    total. A triggered rule snaps the holding fully to target.
//! 4. Records per-coin holdings and per-variant portfolio totals.
//!
//! Step ordinals start at 1. Period rules fire when `ordinal % period == 0`,
//! independent of the wall-clock spacing of the rows.

mod record;

pub use record::{
    BacktestResults, CoinRecord, CoinSeries, Holding, PortfolioRecord, PortfolioTotal,
    RebalancedCoin,
};

use crate::error::{Error, Result};
use crate::portfolio::{PortfolioCoin, profit_percentage};
use crate::price_table::PriceTable;
use crate::rebalance::backtest_rebalance_values;
use crate::stats::backtest_stats;
use crate::strategy::{DcaParams, StrategyParams, Trigger, Variant, VariantSet};
use crate::types::{MS_PER_HOUR, Timestamp};

/// Everything besides prices and coins that shapes a run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BacktestConfig {
    /// Requested window start (echoed into the results)
    pub from: Timestamp,
    /// Requested window end (echoed into the results)
    pub to: Timestamp,
    pub params: StrategyParams,
    /// Wall-clock length of one rebalance period, reported as a step count
    pub rebalance_period_hours: f64,
}

impl BacktestConfig {
    pub fn new(from: Timestamp, to: Timestamp, params: StrategyParams) -> Self {
        Self {
            from,
            to,
            params,
            rebalance_period_hours: 168.0,
        }
    }
}

/// Hours between two epoch-millisecond instants.
#[inline]
pub fn timeframe_hours(t1: Timestamp, t2: Timestamp) -> f64 {
    (t2 - t1) as f64 / MS_PER_HOUR as f64
}

/// How many price-table steps fit in `hours`, given the spacing of `t1`/`t2`.
///
/// Zero when the two instants coincide.
pub fn rebalance_period(t1: Timestamp, t2: Timestamp, hours: f64) -> f64 {
    let timeframe = timeframe_hours(t1, t2);
    if timeframe != 0.0 { hours / timeframe } else { 0.0 }
}

/// Running position of one coin across every variant.
struct CoinState<'a> {
    coin: &'a PortfolioCoin,
    column: usize,
    initial_value: f64,
    holdings: Vec<Holding>,
}

/// Simulate every strategy variant over `prices`.
///
/// Every coin starts with `value / first_price` units in every variant.
/// Returns an error when there is nothing to simulate, when a coin has no
/// price column, or when a period of zero would make a trigger undefined.
/// Non-finite prices are not rejected; they propagate into the output.
pub fn backtest(
    config: &BacktestConfig,
    prices: &PriceTable,
    coins: &[PortfolioCoin],
) -> Result<BacktestResults> {
    if coins.is_empty() {
        return Err(Error::NoCoins);
    }
    if prices.is_empty() {
        return Err(Error::EmptyPriceTable);
    }
    config.params.check_runnable()?;

    let variants = VariantSet::new(&config.params);
    let first = prices.row(0);

    let mut states = coins
        .iter()
        .map(|c| {
            let column = prices.column(&c.coin).ok_or_else(|| Error::MissingPrice {
                coin: c.coin.clone(),
            })?;
            let price = first.prices[column];
            let amount = c.value / price;
            let initial_value = price * amount;
            Ok(CoinState {
                coin: c,
                column,
                initial_value,
                holdings: vec![Holding::new(amount, initial_value); variants.len()],
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let initial_value: f64 = states.iter().map(|s| s.initial_value).sum();
    let timestamps = prices.timestamps();
    let rebalance_period_steps = match timestamps {
        [t1, t2, ..] => rebalance_period(*t1, *t2, config.rebalance_period_hours),
        _ => 0.0,
    };

    log::debug!(
        "backtest: {} coins, {} steps, {} variants [{}], initial value {initial_value:.2}",
        coins.len(),
        prices.len(),
        variants.len(),
        variants.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
    );

    let dca = config.params.dca;
    let mut coin_records: Vec<Vec<CoinRecord>> =
        (0..states.len()).map(|_| Vec::with_capacity(prices.len())).collect();
    let mut portfolio = Vec::with_capacity(prices.len());

    for (step, row) in prices.rows().enumerate() {
        let count = step as u64 + 1;
        let contribute = dca.is_contribution_step(count);

        let totals = variants
            .iter()
            .enumerate()
            .map(|(slot, variant)| {
                step_variant(
                    &mut states,
                    slot,
                    variant,
                    row.prices,
                    count,
                    contribute,
                    &dca,
                    initial_value,
                )
            })
            .collect();

        for (state, records) in states.iter().zip(coin_records.iter_mut()) {
            records.push(CoinRecord {
                timestamp: row.timestamp,
                holdings: state.holdings.clone(),
            });
        }
        portfolio.push(PortfolioRecord {
            timestamp: row.timestamp,
            totals,
        });
    }

    let coins: Vec<CoinSeries> = states
        .iter()
        .zip(coin_records)
        .map(|(s, records)| CoinSeries {
            coin: s.coin.coin.clone(),
            initial_value: s.initial_value,
            records,
        })
        .collect();

    let stats = backtest_stats(&variants, &portfolio, &coins).ok_or(Error::EmptyPriceTable)?;

    Ok(BacktestResults {
        from: config.from,
        to: config.to,
        params: config.params.clone(),
        variants,
        initial_value,
        rebalance_period_steps,
        coins,
        portfolio,
        stats,
    })
}

/// Advance one variant by one step and return its portfolio total.
#[allow(clippy::too_many_arguments)]
fn step_variant(
    states: &mut [CoinState<'_>],
    slot: usize,
    variant: Variant,
    prices: &[f64],
    count: u64,
    contribute: bool,
    dca: &DcaParams,
    initial_value: f64,
) -> PortfolioTotal {
    let add_dca = contribute && variant.has_dca();
    for s in states.iter_mut() {
        let price = prices[s.column];
        let h = &mut s.holdings[slot];
        if add_dca {
            h.amount += dca_units(dca.amount, s.coin.rebalance.percent, price);
        }
        h.coin_value = h.amount * price;
    }

    let mut rebalanced = Vec::new();
    let rule = match variant.trigger() {
        Trigger::Never => None,
        Trigger::Every(p) => Some((0.0, count % u64::from(p) == 0)),
        Trigger::Drift(t) => Some((t, false)),
    };

    if let Some((threshold, due)) = rule {
        let running_total: f64 = states.iter().map(|s| s.holdings[slot].coin_value).sum();
        for s in states.iter_mut() {
            let price = prices[s.column];
            let h = &mut s.holdings[slot];
            let v = backtest_rebalance_values(
                &s.coin.rebalance,
                price,
                h.amount,
                running_total,
                threshold,
            );
            h.difference_pc = v.difference_percentage;

            let snap = if variant.is_threshold() {
                v.reached_threshold
            } else {
                due
            };
            if snap {
                log::trace!(
                    "step {count}: {variant} snapped {} to {:.4} units ({:+.2} pts)",
                    s.coin.coin,
                    v.target_amount,
                    v.difference_percentage
                );
                h.amount = v.target_amount;
                h.coin_value = v.target_value;
                if variant.is_threshold() {
                    rebalanced.push(RebalancedCoin {
                        coin: s.coin.coin.clone(),
                        difference_pc: v.difference_percentage,
                    });
                }
            }
        }
    }

    let mut value = 0.0;
    for s in states.iter_mut() {
        let h = &mut s.holdings[slot];
        h.profit_pc = profit_percentage(s.initial_value, h.coin_value);
        value += h.coin_value;
    }

    PortfolioTotal {
        value,
        profit_pc: profit_percentage(initial_value, value),
        rebalanced,
    }
}

/// Units bought by one DCA contribution for a coin with `percent` target.
#[inline]
fn dca_units(amount: f64, percent: f64, price: f64) -> f64 {
    let value = amount * percent / 100.0;
    if value != 0.0 && price != 0.0 { value / price } else { 0.0 }
}
