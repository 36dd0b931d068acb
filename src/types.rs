//! Core types: Coin, Timestamp

use std::fmt;

use chrono::{DateTime, Utc};

/// Timestamp in milliseconds since the Unix epoch (UTC).
///
/// Price tables are keyed by this value and every result record carries one.
pub type Timestamp = i64;

/// Milliseconds in one hour.
pub const MS_PER_HOUR: i64 = 60 * 60 * 1000;

/// Milliseconds in one day.
pub const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// UTC instant of a [`Timestamp`]; `None` if out of chrono's range.
#[inline]
pub fn to_datetime(ts: Timestamp) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ts)
}

/// A coin identifier, e.g. `BTC` or `ETH`.
///
/// Identifiers are compared exactly (case-sensitive); callers normalise
/// casing before building portfolios and price tables.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Coin(String);

impl Coin {
    pub fn new(s: &str) -> Self {
        Coin(s.to_owned())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Coin {
    fn from(s: &str) -> Self {
        Coin::new(s)
    }
}

impl From<String> for Coin {
    fn from(s: String) -> Self {
        Coin(s)
    }
}

impl AsRef<str> for Coin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
