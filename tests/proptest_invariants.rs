//! Property-based tests for backtest invariants.
//!
//! These tests use proptest to verify that key invariants hold
//! across randomly generated portfolios and price paths.

use coinfolio::stats::{StatPoint, min_max};
use coinfolio::{
    BacktestConfig, BacktestResults, DcaParams, MS_PER_DAY, PortfolioCoin, PriceTableBuilder,
    RebalanceParams, RiskPeriod, StrategyParams, Timestamp, Variant, backtest, risk_analysis,
};
use proptest::prelude::*;

const TICKERS: [&str; 5] = ["BTC", "ETH", "SOL", "ADA", "DOT"];

/// A portfolio of 1-5 coins, started at its target allocation, with a price
/// path of 1-59 daily rows.
#[derive(Clone, Debug)]
struct Scenario {
    coins: Vec<PortfolioCoin>,
    prices: Vec<Vec<f64>>,
}

fn scenario_strategy() -> impl Strategy<Value = Scenario> {
    (1usize..=5, 1usize..60).prop_flat_map(|(n, steps)| {
        (
            100.0f64..100_000.0,
            prop::collection::vec(1.0f64..100.0, n),
            prop::collection::vec(prop::collection::vec(0.01f64..100_000.0, steps), n),
        )
            .prop_map(|(total, weights, prices)| {
                let sum: f64 = weights.iter().sum();
                let coins = weights
                    .iter()
                    .zip(TICKERS)
                    .map(|(w, t)| {
                        let percent = w / sum * 100.0;
                        PortfolioCoin::with_value(t, total * percent / 100.0, percent)
                    })
                    .collect();
                Scenario { coins, prices }
            })
    })
}

fn dca_strategy() -> impl Strategy<Value = DcaParams> {
    prop_oneof![
        Just(DcaParams::default()),
        (1.0f64..500.0, 1u32..10).prop_map(|(amount, period)| DcaParams { amount, period }),
    ]
}

fn run(s: &Scenario, periods: &[u32], thresholds: &[f64], dca: DcaParams) -> BacktestResults {
    let mut builder = PriceTableBuilder::new(s.coins.iter().map(|c| c.coin.clone()));
    for (coin, path) in s.coins.iter().zip(&s.prices) {
        let points: Vec<(Timestamp, f64)> = path
            .iter()
            .enumerate()
            .map(|(i, &p)| (i as Timestamp * MS_PER_DAY, p))
            .collect();
        builder = builder.series(&coin.coin, &points);
    }
    let params = StrategyParams {
        rebalance: RebalanceParams {
            periods: periods.to_vec(),
            thresholds: thresholds.to_vec(),
        },
        dca,
    };
    let config = BacktestConfig::new(0, 60 * MS_PER_DAY, params);
    backtest(&config, &builder.build(), &s.coins).unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    // ========================================================================
    // ENGINE INVARIANTS
    // ========================================================================

    /// Every variant starts at the initial portfolio value
    #[test]
    fn initial_equivalence(
        s in scenario_strategy(),
        period in 1u32..10,
        threshold in 0.5f64..30.0,
    ) {
        let r = run(&s, &[period], &[threshold], DcaParams::default());
        for (slot, variant) in r.variants.iter().enumerate() {
            let first = r.portfolio[0].totals[slot].value;
            prop_assert!(close(first, r.initial_value),
                "{} starts at {} not {}", variant, first, r.initial_value);
        }
    }

    /// Portfolio value is the sum of coin values for every variant and step
    #[test]
    fn value_is_sum_of_coins(
        s in scenario_strategy(),
        period in 1u32..10,
        threshold in 0.5f64..30.0,
        dca in dca_strategy(),
    ) {
        let r = run(&s, &[period], &[threshold], dca);
        for (step, rec) in r.portfolio.iter().enumerate() {
            for (slot, total) in rec.totals.iter().enumerate() {
                let sum: f64 = r.coins.iter().map(|c| c.records[step].holdings[slot].coin_value).sum();
                prop_assert!(close(total.value, sum));
            }
        }
    }

    /// Buy-and-hold never trades
    #[test]
    fn buy_and_hold_amounts_constant(
        s in scenario_strategy(),
        dca in dca_strategy(),
    ) {
        let r = run(&s, &[3], &[5.0], dca);
        for series in &r.coins {
            let first = series.records[0].holdings[0].amount;
            for rec in &series.records {
                prop_assert_eq!(rec.holdings[0].amount, first);
            }
        }
    }

    /// Right after a period snap every coin sits at its target share
    #[test]
    fn period_snap_hits_target(
        s in scenario_strategy(),
        period in 1u32..8,
        dca in dca_strategy(),
    ) {
        let r = run(&s, &[period], &[], dca);
        let variant = if dca.enabled() { Variant::PeriodDca(period) } else { Variant::Period(period) };
        let slot = r.variants.slot(variant).unwrap();
        for (step, rec) in r.portfolio.iter().enumerate() {
            if (step + 1) % period as usize != 0 {
                continue;
            }
            let total = rec.totals[slot].value;
            for (coin, series) in s.coins.iter().zip(&r.coins) {
                let share = series.records[step].holdings[slot].coin_value / total * 100.0;
                prop_assert!((share - coin.rebalance.percent).abs() < 1e-6,
                    "{} at step {}: {} vs {}", coin.coin, step + 1, share, coin.rebalance.percent);
            }
        }
    }

    /// A threshold variant logs exactly the coins whose drift reached it
    #[test]
    fn threshold_log_matches_drift(
        s in scenario_strategy(),
        threshold in 0.5f64..30.0,
    ) {
        let r = run(&s, &[], &[threshold], DcaParams::default());
        let slot = r.variants.slot(Variant::Threshold(threshold)).unwrap();
        for (step, rec) in r.portfolio.iter().enumerate() {
            let log = &rec.totals[slot].rebalanced;
            for series in &r.coins {
                let drift = series.records[step].holdings[slot].difference_pc;
                let logged = log.iter().any(|c| c.coin == series.coin);
                prop_assert_eq!(logged, drift.abs() >= threshold);
            }
        }
    }

    // ========================================================================
    // STATS INVARIANTS
    // ========================================================================

    /// min <= max, and both are real points of the series
    #[test]
    fn stats_bracket_series(
        s in scenario_strategy(),
        period in 1u32..10,
        dca in dca_strategy(),
    ) {
        let r = run(&s, &[period], &[2.0], dca);
        for (slot, variant) in r.variants.iter().enumerate() {
            let mm = r.stats.portfolio.get(variant).unwrap();
            prop_assert!(mm.min.value <= mm.max.value);

            let values: Vec<f64> = r.portfolio.iter().map(|p| p.totals[slot].value).collect();
            let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            prop_assert_eq!(mm.min.value, lo);
            prop_assert_eq!(mm.max.value, hi);
            // First occurrence wins
            let first_lo = values.iter().position(|v| *v == lo).unwrap();
            prop_assert_eq!(mm.min.timestamp, r.portfolio[first_lo].timestamp);
        }
    }

    /// The fold agrees with a naive scan on arbitrary series
    #[test]
    fn min_max_matches_scan(values in prop::collection::vec(-1e6f64..1e6, 1..100)) {
        let points = values.iter().enumerate().map(|(i, &value)| StatPoint {
            timestamp: i as Timestamp,
            value,
            profit_pc: 0.0,
        });
        let mm = min_max(points).unwrap();
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert_eq!(mm.min.value, lo);
        prop_assert_eq!(mm.max.value, hi);
        prop_assert!(values[..mm.min.timestamp as usize].iter().all(|v| *v > lo));
        prop_assert!(values[..mm.max.timestamp as usize].iter().all(|v| *v < hi));
    }
}

// ============================================================================
// RISK ANALYSIS INVARIANTS
// ============================================================================

mod risk_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Heatmap buckets stay in range and win/loss flags are exclusive
        #[test]
        fn rows_are_well_formed(
            prices in prop::collection::vec(0.01f64..100_000.0, 1..400),
            weekly in any::<bool>(),
        ) {
            let period = if weekly { RiskPeriod::Weekly } else { RiskPeriod::Monthly };
            let points: Vec<(Timestamp, f64)> = prices
                .iter()
                .enumerate()
                .map(|(i, &p)| (i as Timestamp * MS_PER_DAY, p))
                .collect();
            let ra = risk_analysis(&points, period);

            prop_assert!(ra.rows.len() <= points.len());
            for row in &ra.rows {
                prop_assert!(row.heatmap <= 4);
                prop_assert!(row.positive + row.negative <= 1.0);
            }
            prop_assert!(ra.summary.positive >= 0.0 && ra.summary.positive <= 1.0);
        }
    }
}
