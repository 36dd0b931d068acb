//! Rebalance arithmetic: drift from target and the trade that removes it.
//!
//! Two entry points share the same math:
//!
//! - [`rebalance_amounts`] serves the live view. Fields that have no meaning
//!   for a coin without a target are `None`.
//! - [`backtest_rebalance_values`] serves the simulation. It measures drift
//!   against a caller-supplied running total (the strategy's own book value,
//!   not the live portfolio) and takes an explicit threshold, where `0.0`
//!   means "always rebalance". Missing fields collapse to `0.0`.
//!
//! Zero totals and zero prices never panic or divide: the affected fields
//! come back as `0.0`/`None`.

use std::fmt;

use crate::portfolio::TargetAllocation;

/// Trade direction needed to reach the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Buy,
    Sell,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "Buy"),
            Direction::Sell => write!(f, "Sell"),
        }
    }
}

/// Live rebalance figures for one coin.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalanceAmounts {
    pub current_percentage: f64,
    pub target_percentage: Option<f64>,
    pub difference_percentage: Option<f64>,
    pub threshold_percentage: f64,
    pub reached_threshold: bool,
    pub target_value: Option<f64>,
    pub target_amount: Option<f64>,
    pub to_balance_value: Option<f64>,
    pub to_balance_amount: Option<f64>,
    pub to_balance_direction: Direction,
}

/// Compute how far a live holding is from its target and what trade fixes it.
///
/// * `price`: current coin price
/// * `amount`: units held
/// * `total_value`: current value of the whole portfolio
pub fn rebalance_amounts(
    target: &TargetAllocation,
    price: f64,
    amount: f64,
    total_value: f64,
) -> RebalanceAmounts {
    let current_value = price * amount;
    let current_percentage = percent_of(current_value, total_value);

    let target_percentage = (target.percent != 0.0).then_some(target.percent);
    let difference_percentage = target_percentage.map(|t| current_percentage - t);
    let threshold_percentage = target.threshold;
    let reached_threshold = difference_percentage
        .is_some_and(|d| d != 0.0 && d.abs() >= threshold_percentage);

    let target_value = target_percentage.map(|t| total_value * (t / 100.0));
    let target_amount = target_value
        .filter(|&v| v != 0.0 && price != 0.0)
        .map(|v| v / price);

    let to_balance_value = target_value.filter(|&v| v != 0.0).map(|v| v - current_value);
    let to_balance_amount = target_amount.map(|a| a - amount);
    let to_balance_direction = match to_balance_value {
        Some(v) if v > 0.0 => Direction::Buy,
        _ => Direction::Sell,
    };

    RebalanceAmounts {
        current_percentage,
        target_percentage,
        difference_percentage,
        threshold_percentage,
        reached_threshold,
        target_value,
        target_amount,
        to_balance_value,
        to_balance_amount,
        to_balance_direction,
    }
}

/// Rebalance figures for one coin inside one simulated strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BacktestRebalanceValues {
    pub to_balance_value: f64,
    pub to_balance_amount: f64,
    /// Current share minus target share, in percentage points
    pub difference_percentage: f64,
    pub reached_threshold: bool,
    pub target_value: f64,
    pub target_amount: f64,
}

/// Drift and target position for a strategy's holding.
///
/// `running_total` is the strategy's own book value across all coins at the
/// current step. A `threshold` of `0.0` forces `reached_threshold = true`;
/// this is how calendar-based rebalancing reuses the drift computation.
pub fn backtest_rebalance_values(
    target: &TargetAllocation,
    price: f64,
    amount: f64,
    running_total: f64,
    threshold: f64,
) -> BacktestRebalanceValues {
    let current_value = price * amount;
    let current_percentage = percent_of(current_value, running_total);

    let has_target = target.percent != 0.0;
    let difference_percentage = if has_target {
        current_percentage - target.percent
    } else {
        0.0
    };

    let reached_threshold = threshold == 0.0
        || (difference_percentage != 0.0 && difference_percentage.abs() >= threshold);

    let target_value = if has_target {
        running_total * (target.percent / 100.0)
    } else {
        0.0
    };
    let target_amount = if target_value != 0.0 && price != 0.0 {
        target_value / price
    } else {
        0.0
    };

    let to_balance_value = if target_value != 0.0 {
        target_value - current_value
    } else {
        0.0
    };
    let to_balance_amount = if target_amount != 0.0 {
        target_amount - amount
    } else {
        0.0
    };

    BacktestRebalanceValues {
        to_balance_value,
        to_balance_amount,
        difference_percentage,
        reached_threshold,
        target_value,
        target_amount,
    }
}

/// `part / whole * 100`, or 0 when `whole` is zero.
#[inline]
fn percent_of(part: f64, whole: f64) -> f64 {
    if whole != 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}
