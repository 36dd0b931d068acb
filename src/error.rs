//! Errors returned by the backtest engine's precondition checks.

use crate::types::Coin;

/// Errors that prevent a backtest from running.
///
/// The arithmetic itself never fails: zero denominators yield 0 or `None`.
/// These variants cover malformed inputs that would otherwise surface as
/// `NaN`/`Infinity` in every output row.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// The price table has no rows (no timestamp covers every coin).
    #[error("price table is empty")]
    EmptyPriceTable,

    /// A portfolio coin has no column in the price table.
    #[error("no prices for coin {coin}")]
    MissingPrice { coin: Coin },

    /// The portfolio has no coins.
    #[error("portfolio has no coins")]
    NoCoins,

    /// Strategy parameters failed validation.
    #[error("invalid strategy parameters: {0}")]
    InvalidParams(String),
}

pub type Result<T> = std::result::Result<T, Error>;
