//! Command orchestration: load inputs, call the engine, report.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::info;
use rustc_hash::FxHashMap;

use coinfolio::portfolio::{TotalsMode, portfolio_totals};
use coinfolio::rebalance::{RebalanceAmounts, rebalance_amounts};
use coinfolio::{BacktestResults, Coin, RiskAnalysis, RiskPeriod, backtest, risk_analysis};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::prices;
use crate::report;

/// Load prices for the configured coins and run the backtest.
pub fn backtest_from_config(config: &Config) -> Result<BacktestResults> {
    let totals = config.allocation();
    let coins = config.portfolio_coins();
    info!(
        "portfolio: {} coins, ${:.2} initial value, {:.2}% allocated",
        coins.len(),
        totals.total_value,
        totals.percent_allocated
    );
    let ids: Vec<Coin> = coins.iter().map(|c| c.coin.clone()).collect();
    let table = prices::load_table(&config.prices_dir(), &ids, &config.window())?;

    let bt = config.backtest_config();
    info!(
        "running {} strategy variants over {} steps",
        coinfolio::VariantSet::new(&bt.params).len(),
        table.len()
    );
    Ok(backtest(&bt, &table, &coins)?)
}

/// `run`: print the report, or write JSON to `json_out`.
pub fn run_backtest(config: &Config, json_out: Option<&Path>) -> Result<()> {
    let results = backtest_from_config(config)?;
    match json_out {
        Some(path) => {
            let file = File::create(path)?;
            let mut w = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut w, &results)?;
            w.flush()?;
            info!("results written to {}", path.display());
        }
        None => report::write_backtest(&mut io::stdout().lock(), &results)?,
    }
    Ok(())
}

/// Rebalance figures for every configured coin at the given spot prices.
///
/// Every coin must have a spot price.
pub fn plan(
    config: &Config,
    spot: &FxHashMap<Coin, f64>,
) -> Result<(f64, Vec<(Coin, RebalanceAmounts)>)> {
    let coins = config.portfolio_coins();
    if let Some(missing) = coins.iter().find(|c| !spot.contains_key(&c.coin)) {
        return Err(Error::Config(format!("no spot price for {}", missing.coin)));
    }

    let totals = portfolio_totals(&coins, |c| spot.get(c).copied(), TotalsMode::Live);
    if !totals.allocated_amounts_targets {
        log::warn!("some coins have no holding or no target allocation");
    }

    let rows = coins
        .iter()
        .map(|c| {
            let price = spot.get(&c.coin).copied().unwrap_or(0.0);
            (
                c.coin.clone(),
                rebalance_amounts(&c.rebalance, price, c.amount, totals.total_value),
            )
        })
        .collect();
    Ok((totals.total_value, rows))
}

/// `plan`: print the live rebalance plan.
pub fn run_plan(config: &Config, spot_path: &Path) -> Result<()> {
    let spot = prices::load_spot(spot_path)?;
    let (total, rows) = plan(config, &spot)?;
    report::write_plan(&mut io::stdout().lock(), total, &rows)?;
    Ok(())
}

/// Risk analysis of one history file.
pub fn analyse(history: &Path, period: RiskPeriod) -> Result<RiskAnalysis> {
    let mut points = prices::load_history(history)?;
    points.sort_by_key(|&(ts, _)| ts);
    Ok(risk_analysis(&points, period))
}

/// `risk`: print the risk table.
pub fn run_risk(history: &Path, period: RiskPeriod) -> Result<()> {
    let analysis = analyse(history, period)?;
    report::write_risk(&mut io::stdout().lock(), &analysis)?;
    Ok(())
}
