//! JSON layout of backtest results (requires the `serde` feature).

#![cfg(feature = "serde")]

use coinfolio::{
    BacktestConfig, BacktestResults, Coin, DcaParams, MS_PER_DAY, PortfolioCoin,
    PriceTableBuilder, RebalanceParams, StrategyParams, Variant, backtest,
};
use serde_json::{Value, json};

fn results() -> BacktestResults {
    let day = |i: i64| i * MS_PER_DAY;
    let prices = PriceTableBuilder::new([Coin::new("BTC"), Coin::new("ETH")])
        .series(&Coin::new("BTC"), &[(day(0), 100.0), (day(1), 200.0), (day(2), 200.0)])
        .series(&Coin::new("ETH"), &[(day(0), 100.0), (day(1), 50.0), (day(2), 50.0)])
        .build();
    let coins = [
        PortfolioCoin::with_value("BTC", 600.0, 60.0),
        PortfolioCoin::with_value("ETH", 400.0, 40.0),
    ];
    let params = StrategyParams {
        rebalance: RebalanceParams {
            periods: vec![7],
            thresholds: vec![10.0],
        },
        dca: DcaParams {
            amount: 10.0,
            period: 2,
        },
    };
    backtest(&BacktestConfig::new(day(0), day(2), params), &prices, &coins).unwrap()
}

#[test]
fn variants_are_tagged() {
    let value = serde_json::to_value(results().variants).unwrap();
    assert_eq!(
        value["variants"],
        json!([
            { "kind": "buy_and_hold" },
            { "kind": "dca" },
            { "kind": "period", "param": 7 },
            { "kind": "threshold", "param": 10.0 },
            { "kind": "period_dca", "param": 7 },
            { "kind": "threshold_dca", "param": 10.0 },
        ])
    );
}

#[test]
fn empty_rebalance_log_is_skipped() {
    let r = results();
    let slot = r.variants.slot(Variant::Threshold(10.0)).unwrap();
    // Day 1 drifts BTC to 85.7% and snaps; day 0 and day 2 do not
    assert!(r.portfolio[0].totals[slot].rebalanced.is_empty());
    assert!(!r.portfolio[1].totals[slot].rebalanced.is_empty());

    let value = serde_json::to_value(&r).unwrap();
    let day0 = &value["portfolio"][0]["totals"][slot];
    let day1 = &value["portfolio"][1]["totals"][slot];
    assert!(day0.get("rebalanced").is_none());
    assert_eq!(day1["rebalanced"][0]["coin"], Value::from("BTC"));
}

#[test]
fn results_round_trip() {
    let r = results();
    let text = serde_json::to_string(&r).unwrap();
    let back: BacktestResults = serde_json::from_str(&text).unwrap();

    assert_eq!(back.variants, r.variants);
    assert_eq!(back.params, r.params);
    assert_eq!(back.len(), r.len());
    assert_eq!(back.stats.portfolio.len(), r.stats.portfolio.len());
    for (a, b) in back.portfolio.iter().zip(&r.portfolio) {
        assert_eq!(a.timestamp, b.timestamp);
        for (x, y) in a.totals.iter().zip(&b.totals) {
            assert!((x.value - y.value).abs() < 1e-9);
            assert_eq!(x.rebalanced.len(), y.rebalanced.len());
        }
    }
    assert_eq!(back.coins[0].coin, Coin::new("BTC"));
}
