//! Backtest date window.
//!
//! A window always spans at least [`MIN_WINDOW_DAYS`]. Setting either end so
//! that the span becomes shorter (or negative) pulls `from` back to three
//! calendar months before `to`.

use chrono::{DateTime, Duration, Months, Utc};

use crate::types::Timestamp;

/// Shortest accepted window.
pub const MIN_WINDOW_DAYS: i64 = 90;

/// Inclusive `[from, to]` range of a backtest, in UTC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BacktestWindow {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl BacktestWindow {
    /// A normalised window ending at `to`.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self::ending_at(to).with_from(from)
    }

    /// The three months leading up to `to`.
    pub fn ending_at(to: DateTime<Utc>) -> Self {
        Self {
            from: three_months_before(to),
            to,
        }
    }

    /// Move the start. Too short a span resets it to `to - 3 months`.
    pub fn with_from(mut self, from: DateTime<Utc>) -> Self {
        self.from = if too_short(from, self.to) {
            three_months_before(self.to)
        } else {
            from
        };
        self
    }

    /// Move the end. Too short a span also resets the start.
    pub fn with_to(mut self, to: DateTime<Utc>) -> Self {
        if too_short(self.from, to) {
            self.from = three_months_before(to);
        }
        self.to = to;
        self
    }

    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    pub fn to(&self) -> DateTime<Utc> {
        self.to
    }

    /// Both ends as epoch milliseconds.
    pub fn as_millis(&self) -> (Timestamp, Timestamp) {
        (self.from.timestamp_millis(), self.to.timestamp_millis())
    }

    /// Whether `ts` falls inside the window.
    pub fn contains(&self, ts: Timestamp) -> bool {
        let (from, to) = self.as_millis();
        (from..=to).contains(&ts)
    }
}

fn too_short(from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
    to - from < Duration::days(MIN_WINDOW_DAYS)
}

fn three_months_before(to: DateTime<Utc>) -> DateTime<Utc> {
    to.checked_sub_months(Months::new(3))
        .unwrap_or(to - Duration::days(MIN_WINDOW_DAYS))
}
