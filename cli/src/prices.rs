//! Price-history files.
//!
//! A history is a JSON array of `[epoch_ms, price]` pairs, either bare or
//! under a `"prices"` key (the shape of a CoinGecko `market_chart` response).
//! Spot prices for `plan` are a flat `{"BTC": 41000.0, ...}` object.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::Deserialize;

use coinfolio::{BacktestWindow, Coin, PriceTable, PriceTableBuilder, Timestamp};

use crate::error::{Error, Result};

#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryFile {
    Wrapped { prices: Vec<(f64, f64)> },
    Bare(Vec<(f64, f64)>),
}

/// Parse a price history from JSON text. Points come back in file order.
pub fn parse_history(json: &str) -> Result<Vec<(Timestamp, f64)>> {
    let points = match serde_json::from_str(json)? {
        HistoryFile::Wrapped { prices } | HistoryFile::Bare(prices) => prices,
    };
    Ok(points
        .into_iter()
        .map(|(ts, price)| (ts as Timestamp, price))
        .collect())
}

/// Read one price-history file.
pub fn load_history(path: &Path) -> Result<Vec<(Timestamp, f64)>> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::PriceRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_history(&contents)
}

/// Path of a coin's history inside `dir`.
pub fn history_path(dir: &Path, coin: &Coin) -> PathBuf {
    dir.join(format!("{coin}.json"))
}

/// Load every coin's history and merge them into a fully covered table.
///
/// Any unreadable file fails the whole load: the engine needs every coin on
/// every row. Points outside `window` are dropped.
pub fn load_table(dir: &Path, coins: &[Coin], window: &BacktestWindow) -> Result<PriceTable> {
    let mut builder = PriceTableBuilder::new(coins.iter().cloned());
    for coin in coins {
        let path = history_path(dir, coin);
        let points: Vec<_> = load_history(&path)?
            .into_iter()
            .filter(|&(ts, _)| window.contains(ts))
            .collect();
        log::info!("{coin}: {} price points from {}", points.len(), path.display());
        builder = builder.series(coin, &points);
    }
    let table = builder.build();
    log::info!("price table: {} fully covered timestamps", table.len());
    Ok(table)
}

/// Parse a spot-price map from JSON text. Keys are upper-cased.
pub fn parse_spot(json: &str) -> Result<FxHashMap<Coin, f64>> {
    let raw: FxHashMap<String, f64> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .map(|(k, v)| (Coin::from(k.trim().to_uppercase()), v))
        .collect())
}

/// Read a spot-price file.
pub fn load_spot(path: &Path) -> Result<FxHashMap<Coin, f64>> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::PriceRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_spot(&contents)
}
