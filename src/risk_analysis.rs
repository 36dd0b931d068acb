//! Period-over-period performance of a single price history.
//!
//! Snapshots are taken on the first day of each month ([`RiskPeriod::Monthly`])
//! or on Mondays ([`RiskPeriod::Weekly`]), using UTC calendar dates. When a
//! qualifying day has several observations only the first is used.
//!
//! Each snapshot row carries its change from the previous snapshot plus a
//! heatmap bucket in `0..=4`. Gains are bucketed on a scale spanning the
//! observed winning performances, losses on an inverted scale spanning the
//! losing ones, so that `4` is always the strongest move. The summary row holds
//! averages and a Kelly Criterion estimate.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::Error;
use crate::portfolio::profit_percentage;
use crate::types::{Timestamp, to_datetime};

/// Number of heatmap buckets.
pub const HEATMAP_BUCKETS: u8 = 5;

/// Label of the summary row.
pub const SUMMARY_LABEL: &str = "Average so far";

/// Snapshot cadence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RiskPeriod {
    #[default]
    Monthly,
    Weekly,
}

impl RiskPeriod {
    fn qualifies(self, date: NaiveDate) -> bool {
        match self {
            RiskPeriod::Monthly => date.day() == 1,
            RiskPeriod::Weekly => date.weekday() == Weekday::Mon,
        }
    }
}

impl fmt::Display for RiskPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskPeriod::Monthly => write!(f, "monthly"),
            RiskPeriod::Weekly => write!(f, "weekly"),
        }
    }
}

impl FromStr for RiskPeriod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "monthly" => Ok(RiskPeriod::Monthly),
            "weekly" => Ok(RiskPeriod::Weekly),
            other => Err(Error::InvalidParams(format!(
                "unknown risk period {other:?} (expected monthly or weekly)"
            ))),
        }
    }
}

/// One snapshot, or the summary.
///
/// In the summary row the indicator fields hold averages (win rate, loss rate)
/// instead of `0`/`1` flags.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiskRow {
    /// Date as `Jan 01 2021`, or [`SUMMARY_LABEL`]
    pub label: String,
    /// `None` for the summary
    pub timestamp: Option<Timestamp>,
    /// Price at the snapshot (0 for the summary)
    pub open: f64,
    /// Change since the previous snapshot, in percent
    pub performance: f64,
    pub positive: f64,
    pub negative: f64,
    /// `performance` if positive, else 0
    pub winning: f64,
    /// `performance` if negative, else 0
    pub losing: f64,
    pub heatmap: u8,
    /// Kelly Criterion, percent (summary only)
    pub kc: f64,
}

/// Snapshot rows plus their summary.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiskAnalysis {
    pub period: RiskPeriod,
    pub summary: RiskRow,
    pub rows: Vec<RiskRow>,
}

impl RiskAnalysis {
    /// Summary first, then the snapshots in chronological order.
    pub fn into_rows(self) -> Vec<RiskRow> {
        let mut rows = Vec::with_capacity(self.rows.len() + 1);
        rows.push(self.summary);
        rows.extend(self.rows);
        rows
    }
}

/// Analyse a `(timestamp, price)` history, ascending by timestamp.
pub fn risk_analysis(prices: &[(Timestamp, f64)], period: RiskPeriod) -> RiskAnalysis {
    let mut rows: Vec<RiskRow> = Vec::new();
    let mut previous_price = 0.0;
    let mut last_day: Option<NaiveDate> = None;

    for &(ts, price) in prices {
        let Some(dt) = to_datetime(ts) else {
            log::warn!("risk analysis: skipping out-of-range timestamp {ts}");
            continue;
        };
        let day = dt.date_naive();
        if !period.qualifies(day) || last_day == Some(day) {
            continue;
        }
        last_day = Some(day);

        let performance = profit_percentage(previous_price, price);
        rows.push(RiskRow {
            label: dt.format("%b %d %Y").to_string(),
            timestamp: Some(ts),
            open: price,
            performance,
            positive: if performance > 0.0 { 1.0 } else { 0.0 },
            negative: if performance < 0.0 { 1.0 } else { 0.0 },
            winning: performance.max(0.0),
            losing: performance.min(0.0),
            heatmap: 0,
            kc: 0.0,
        });
        previous_price = price;
    }

    let summary = summarize(&rows);
    assign_heatmap(&mut rows);

    log::debug!(
        "risk analysis ({period}): {} snapshots, kelly {:.2}",
        rows.len(),
        summary.kc
    );

    RiskAnalysis {
        period,
        summary,
        rows,
    }
}

/// Averages over `n - 1` (the first snapshot has no predecessor) and Kelly.
fn summarize(rows: &[RiskRow]) -> RiskRow {
    let avg = |f: fn(&RiskRow) -> f64| -> f64 {
        if rows.len() < 2 {
            return 0.0;
        }
        rows.iter().map(f).sum::<f64>() / (rows.len() - 1) as f64
    };

    let performance = avg(|r| r.performance);
    let positive = avg(|r| r.positive);
    let negative = avg(|r| r.negative);
    let winning = avg(|r| r.winning);
    let losing = avg(|r| r.losing);

    RiskRow {
        label: SUMMARY_LABEL.to_owned(),
        timestamp: None,
        open: 0.0,
        performance,
        positive,
        negative,
        winning,
        losing,
        heatmap: 0,
        kc: kelly_criterion(positive, negative, winning, losing),
    }
}

/// `(win_rate - loss_rate / b) * 100` with `b = avg_win / |avg_loss|`.
///
/// Negative infinity when `b` is zero or undefined.
pub fn kelly_criterion(win_rate: f64, loss_rate: f64, avg_win: f64, avg_loss: f64) -> f64 {
    let b = avg_win / avg_loss.abs();
    if b != 0.0 && !b.is_nan() {
        (win_rate - loss_rate / b) * 100.0
    } else {
        f64::NEG_INFINITY
    }
}

fn assign_heatmap(rows: &mut [RiskRow]) {
    let (win_min, win_max) = bounds(rows.iter().map(|r| r.winning));
    let (loss_min, loss_max) = bounds(rows.iter().map(|r| r.losing));

    for r in rows.iter_mut() {
        r.heatmap = if r.winning > 0.0 {
            bucket(r.winning, win_min, win_max)
        } else if loss_max > loss_min {
            HEATMAP_BUCKETS - 1 - bucket(r.losing, loss_min, loss_max)
        } else {
            0
        };
    }
}

/// Equal-width bucket of `x` in `[min, max]`, clamped to the valid range.
fn bucket(x: f64, min: f64, max: f64) -> u8 {
    let range = max - min;
    if range <= 0.0 || range.is_nan() {
        return 0;
    }
    let size = range / f64::from(HEATMAP_BUCKETS);
    let b = ((x - min) / size).floor();
    b.clamp(0.0, f64::from(HEATMAP_BUCKETS - 1)) as u8
}

fn bounds<I: Iterator<Item = f64>>(values: I) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo > hi { (0.0, 0.0) } else { (lo, hi) }
}
