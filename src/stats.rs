//! Statistics reducer: value extrema per strategy variant.
//!
//! For the portfolio and for each coin, every variant's series is folded once
//! to find its lowest and highest value. Comparisons are strict, so on ties the
//! earliest observation wins.

use crate::backtest::{BacktestResults, CoinSeries, PortfolioRecord};
use crate::strategy::{Variant, VariantSet};
use crate::types::{Coin, Timestamp};

/// One observation of a series.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatPoint {
    pub timestamp: Timestamp,
    pub value: f64,
    pub profit_pc: f64,
}

/// Lowest and highest observation of a series.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MinMax {
    pub min: StatPoint,
    pub max: StatPoint,
}

/// Fold `points` into their extrema. `None` for an empty series.
///
/// `NaN` values are never selected while the series holds any other value;
/// an all-`NaN` series reports its first point.
///
/// ```
/// use coinfolio::stats::{StatPoint, min_max};
///
/// let pts = [(1, 5.0), (2, 3.0), (3, 3.0), (4, 9.0)]
///     .map(|(timestamp, value)| StatPoint { timestamp, value, profit_pc: 0.0 });
/// let mm = min_max(pts).unwrap();
/// assert_eq!(mm.min.timestamp, 2);
/// assert_eq!(mm.max.value, 9.0);
/// ```
pub fn min_max<I>(points: I) -> Option<MinMax>
where
    I: IntoIterator<Item = StatPoint>,
{
    let mut iter = points.into_iter();
    let first = iter.next()?;
    Some(iter.fold(MinMax { min: first, max: first }, |mut acc, p| {
        if acc.min.value.is_nan() && !p.value.is_nan() {
            return MinMax { min: p, max: p };
        }
        if p.value < acc.min.value {
            acc.min = p;
        }
        if p.value > acc.max.value {
            acc.max = p;
        }
        acc
    }))
}

/// Extrema of every variant of one series.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariantStats {
    entries: Vec<(Variant, MinMax)>,
}

impl VariantStats {
    pub fn get(&self, variant: Variant) -> Option<&MinMax> {
        self.entries.iter().find(|(v, _)| *v == variant).map(|(_, mm)| mm)
    }

    /// Entries in variant-set order.
    pub fn iter(&self) -> impl Iterator<Item = (Variant, &MinMax)> + '_ {
        self.entries.iter().map(|(v, mm)| (*v, mm))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Extrema for the whole portfolio and for each coin.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BacktestStats {
    pub portfolio: VariantStats,
    /// Per coin, in portfolio order
    pub coins: Vec<(Coin, VariantStats)>,
}

impl BacktestStats {
    pub fn coin(&self, coin: &Coin) -> Option<&VariantStats> {
        self.coins.iter().find(|(c, _)| c == coin).map(|(_, s)| s)
    }
}

/// Reduce engine output to per-variant extrema.
///
/// Returns `None` if the series is empty.
pub fn backtest_stats(
    variants: &VariantSet,
    portfolio: &[PortfolioRecord],
    coins: &[CoinSeries],
) -> Option<BacktestStats> {
    let portfolio_stats = reduce(variants, |slot| {
        portfolio.iter().map(move |r| {
            let t = &r.totals[slot];
            StatPoint {
                timestamp: r.timestamp,
                value: t.value,
                profit_pc: t.profit_pc,
            }
        })
    })?;

    let coin_stats = coins
        .iter()
        .map(|series| {
            let stats = reduce(variants, |slot| {
                series.records.iter().map(move |r| {
                    let h = &r.holdings[slot];
                    StatPoint {
                        timestamp: r.timestamp,
                        value: h.coin_value,
                        profit_pc: h.profit_pc,
                    }
                })
            })?;
            Some((series.coin.clone(), stats))
        })
        .collect::<Option<Vec<_>>>()?;

    Some(BacktestStats {
        portfolio: portfolio_stats,
        coins: coin_stats,
    })
}

/// Recompute the statistics of a finished run.
pub fn results_stats(results: &BacktestResults) -> Option<BacktestStats> {
    backtest_stats(&results.variants, &results.portfolio, &results.coins)
}

fn reduce<F, I>(variants: &VariantSet, series: F) -> Option<VariantStats>
where
    F: Fn(usize) -> I,
    I: Iterator<Item = StatPoint>,
{
    let entries = variants
        .iter()
        .enumerate()
        .map(|(slot, v)| min_max(series(slot)).map(|mm| (v, mm)))
        .collect::<Option<Vec<_>>>()?;
    Some(VariantStats { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::{CoinRecord, Holding, PortfolioTotal};
    use crate::strategy::{DcaParams, RebalanceParams, StrategyParams};

    fn point(timestamp: Timestamp, value: f64) -> StatPoint {
        StatPoint {
            timestamp,
            value,
            profit_pc: value - 100.0,
        }
    }

    fn variants() -> VariantSet {
        VariantSet::new(&StrategyParams {
            rebalance: RebalanceParams {
                periods: vec![7],
                thresholds: vec![],
            },
            dca: DcaParams::default(),
        })
    }

    fn portfolio(values: &[(f64, f64)]) -> Vec<PortfolioRecord> {
        values
            .iter()
            .enumerate()
            .map(|(i, &(a, b))| PortfolioRecord {
                timestamp: i as Timestamp,
                totals: vec![
                    PortfolioTotal {
                        value: a,
                        profit_pc: 0.0,
                        rebalanced: vec![],
                    },
                    PortfolioTotal {
                        value: b,
                        profit_pc: 0.0,
                        rebalanced: vec![],
                    },
                ],
            })
            .collect()
    }

    #[test]
    fn min_max_empty_is_none() {
        assert_eq!(min_max(std::iter::empty()), None);
    }

    #[test]
    fn min_max_single_point() {
        let mm = min_max([point(7, 42.0)]).unwrap();
        assert_eq!(mm.min, mm.max);
        assert_eq!(mm.min.timestamp, 7);
    }

    #[test]
    fn ties_resolve_to_first() {
        let pts = [
            point(0, 5.0),
            point(1, 1.0),
            point(2, 9.0),
            point(3, 1.0),
            point(4, 9.0),
        ];
        let mm = min_max(pts).unwrap();
        assert_eq!(mm.min.timestamp, 1);
        assert_eq!(mm.max.timestamp, 2);
        assert_eq!(mm.max.profit_pc, -91.0);
    }

    #[test]
    fn nan_never_wins() {
        let mm = min_max([point(0, 2.0), point(1, f64::NAN), point(2, 3.0)]).unwrap();
        assert_eq!(mm.min.value, 2.0);
        assert_eq!(mm.max.value, 3.0);
    }

    #[test]
    fn leading_nan_is_skipped() {
        let mm = min_max([point(0, f64::NAN), point(1, 1.0), point(2, 2.0)]).unwrap();
        assert_eq!(mm.min.timestamp, 1);
        assert_eq!(mm.max.timestamp, 2);

        let mm = min_max([point(0, f64::NAN), point(1, f64::NAN)]).unwrap();
        assert_eq!(mm.min.timestamp, 0);
        assert!(mm.max.value.is_nan());
    }

    #[test]
    fn per_variant_portfolio_stats() {
        let v = variants();
        let p = portfolio(&[(10.0, 10.0), (12.0, 8.0), (11.0, 15.0)]);
        let stats = backtest_stats(&v, &p, &[]).unwrap();

        let bh = stats.portfolio.get(Variant::BuyAndHold).unwrap();
        assert_eq!(bh.min.timestamp, 0);
        assert_eq!(bh.max.timestamp, 1);

        let rp = stats.portfolio.get(Variant::Period(7)).unwrap();
        assert_eq!(rp.min.value, 8.0);
        assert_eq!(rp.max.value, 15.0);

        assert!(stats.portfolio.get(Variant::Dca).is_none());
        assert_eq!(stats.portfolio.len(), 2);
    }

    #[test]
    fn per_coin_stats_use_coin_value() {
        let v = variants();
        let p = portfolio(&[(1.0, 1.0), (2.0, 2.0)]);
        let holding = |coin_value| Holding {
            amount: 1.0,
            coin_value,
            profit_pc: 0.0,
            difference_pc: 0.0,
        };
        let coins = vec![CoinSeries {
            coin: Coin::new("BTC"),
            initial_value: 1.0,
            records: vec![
                CoinRecord {
                    timestamp: 0,
                    holdings: vec![holding(3.0), holding(3.0)],
                },
                CoinRecord {
                    timestamp: 1,
                    holdings: vec![holding(1.0), holding(4.0)],
                },
            ],
        }];
        let stats = backtest_stats(&v, &p, &coins).unwrap();
        let btc = stats.coin(&Coin::new("BTC")).unwrap();
        assert_eq!(btc.get(Variant::BuyAndHold).unwrap().min.value, 1.0);
        assert_eq!(btc.get(Variant::Period(7)).unwrap().max.timestamp, 1);
        assert!(stats.coin(&Coin::new("ETH")).is_none());
    }

    #[test]
    fn empty_series_is_none() {
        assert!(backtest_stats(&variants(), &[], &[]).is_none());
    }
}
