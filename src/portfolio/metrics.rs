//! Profit metrics.

/// Percentage change from `start` to `end`: `(end / start - 1) * 100`.
///
/// A zero `start` yields exactly `0.0`, never `NaN` or infinity. Every profit
/// figure in a backtest goes through this function, so a portfolio or coin
/// that started with no value always reports zero profit.
///
/// ```
/// use coinfolio::portfolio::profit_percentage;
///
/// assert_eq!(profit_percentage(100.0, 150.0), 50.0);
/// assert_eq!(profit_percentage(0.0, 150.0), 0.0);
/// ```
#[inline]
pub fn profit_percentage(start: f64, end: f64) -> f64 {
    if start != 0.0 && !start.is_nan() {
        (end / start - 1.0) * 100.0
    } else {
        0.0
    }
}
