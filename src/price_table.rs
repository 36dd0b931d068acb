//! Date-aligned price table: one row per timestamp, one column per coin.
//!
//! Price histories arrive per coin as `(epoch_ms, price)` pairs and rarely
//! line up exactly. [`PriceTableBuilder`] merges them and keeps only the
//! timestamps at which *every* requested coin has a price, so the engine can
//! assume full coverage on every row.
//!
//! ```
//! use coinfolio::{Coin, PriceTableBuilder};
//!
//! let table = PriceTableBuilder::new([Coin::new("BTC"), Coin::new("ETH")])
//!     .series(&Coin::new("BTC"), &[(1_000, 30_000.0), (2_000, 31_000.0)])
//!     .series(&Coin::new("ETH"), &[(2_000, 2_000.0), (3_000, 2_100.0)])
//!     .build();
//!
//! // Only t=2000 has both coins
//! assert_eq!(table.timestamps(), &[2_000]);
//! assert_eq!(table.price(0, &Coin::new("ETH")), Some(2_000.0));
//! ```

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::types::{Coin, Timestamp};

/// Prices for every coin, ascending by unique timestamp.
///
/// Rows are stored flat (row-major) with one price per column.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriceTable {
    coins: Vec<Coin>,
    timestamps: Vec<Timestamp>,
    prices: Vec<f64>,
}

/// A borrowed row of a [`PriceTable`].
#[derive(Clone, Copy, Debug)]
pub struct PriceRow<'a> {
    pub timestamp: Timestamp,
    /// One price per column, in [`PriceTable::coins`] order
    pub prices: &'a [f64],
}

impl PriceTable {
    /// Build a table from already-keyed rows, dropping incomplete ones.
    ///
    /// A row is kept only if it has a price for every coin in `coins`.
    /// Prices for coins outside `coins` are ignored.
    pub fn from_rows(coins: &[Coin], rows: &BTreeMap<Timestamp, FxHashMap<Coin, f64>>) -> Self {
        let mut table = PriceTable {
            coins: coins.to_vec(),
            timestamps: Vec::with_capacity(rows.len()),
            prices: Vec::with_capacity(rows.len() * coins.len()),
        };
        'rows: for (&ts, row) in rows {
            let start = table.prices.len();
            for coin in coins {
                match row.get(coin) {
                    Some(&p) => table.prices.push(p),
                    None => {
                        table.prices.truncate(start);
                        continue 'rows;
                    }
                }
            }
            table.timestamps.push(ts);
        }
        table
    }

    /// Column coins, in order.
    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    /// Row timestamps, ascending.
    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Column index of `coin`, if present.
    pub fn column(&self, coin: &Coin) -> Option<usize> {
        self.coins.iter().position(|c| c == coin)
    }

    /// Row `i`. Panics if out of bounds.
    pub fn row(&self, i: usize) -> PriceRow<'_> {
        let width = self.coins.len();
        PriceRow {
            timestamp: self.timestamps[i],
            prices: &self.prices[i * width..(i + 1) * width],
        }
    }

    /// Iterate rows in ascending timestamp order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = PriceRow<'_>> + '_ {
        (0..self.len()).map(move |i| self.row(i))
    }

    /// Price of `coin` on row `i`.
    pub fn price(&self, i: usize, coin: &Coin) -> Option<f64> {
        if i >= self.len() {
            return None;
        }
        let col = self.column(coin)?;
        Some(self.prices[i * self.coins.len() + col])
    }

    /// `(timestamp, price)` history of a single coin.
    pub fn series(&self, coin: &Coin) -> Option<Vec<(Timestamp, f64)>> {
        let col = self.column(coin)?;
        Some(self.rows().map(|r| (r.timestamp, r.prices[col])).collect())
    }
}

/// Merges per-coin price histories into a [`PriceTable`].
#[derive(Clone, Debug)]
pub struct PriceTableBuilder {
    coins: Vec<Coin>,
    index: FxHashMap<Coin, usize>,
    rows: BTreeMap<Timestamp, Vec<Option<f64>>>,
}

impl PriceTableBuilder {
    /// Start a table for the given coins. Duplicate coins are collapsed.
    pub fn new<I: IntoIterator<Item = Coin>>(coins: I) -> Self {
        let mut list = Vec::new();
        let mut index = FxHashMap::default();
        for coin in coins {
            if !index.contains_key(&coin) {
                index.insert(coin.clone(), list.len());
                list.push(coin);
            }
        }
        Self {
            coins: list,
            index,
            rows: BTreeMap::new(),
        }
    }

    /// Add one coin's history. Later points overwrite earlier ones at the
    /// same timestamp. Histories for coins not passed to [`new`](Self::new)
    /// are ignored.
    pub fn series(mut self, coin: &Coin, points: &[(Timestamp, f64)]) -> Self {
        let Some(&col) = self.index.get(coin) else {
            log::warn!("ignoring price history for {coin}: not part of the table");
            return self;
        };
        let width = self.coins.len();
        for &(ts, price) in points {
            self.rows.entry(ts).or_insert_with(|| vec![None; width])[col] = Some(price);
        }
        self
    }

    /// Finish the table, keeping only fully covered timestamps.
    pub fn build(self) -> PriceTable {
        let width = self.coins.len();
        let mut timestamps = Vec::with_capacity(self.rows.len());
        let mut prices = Vec::with_capacity(self.rows.len() * width);
        let mut dropped = 0usize;

        for (ts, row) in self.rows {
            if row.iter().all(Option::is_some) {
                timestamps.push(ts);
                prices.extend(row.into_iter().flatten());
            } else {
                dropped += 1;
            }
        }

        if dropped > 0 {
            log::debug!(
                "price table: dropped {dropped} timestamps without a price for every coin ({} kept)",
                timestamps.len()
            );
        }

        PriceTable {
            coins: self.coins,
            timestamps,
            prices,
        }
    }
}
