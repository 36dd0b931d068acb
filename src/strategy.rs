//! Strategy parameters and the set of strategy variants they expand to.
//!
//! One backtest runs several strategies side by side over the same prices:
//!
//! | Variant | Holdings change when |
//! |---------|----------------------|
//! | `BuyAndHold` | never |
//! | `Dca` | a DCA contribution is due |
//! | `Period(p)` | every `p`-th step (full snap to target) |
//! | `Threshold(t)` | a coin drifts `>= t` points from target |
//! | `PeriodDca(p)` / `ThresholdDca(t)` | both DCA and the rebalance rule |
//!
//! DCA-backed variants exist only when `dca.amount > 0`.

use std::fmt;

use crate::error::{Error, Result};

/// Upper bound on periods and thresholds accepted by [`StrategyParams::validate`].
///
/// The engine itself handles any number; the cap keeps reports readable.
pub const MAX_RULES: usize = 3;

/// Rebalancing rules to simulate.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalanceParams {
    /// Calendar rebalance cadences, in steps (price-table rows)
    pub periods: Vec<u32>,
    /// Drift thresholds, in percentage points
    pub thresholds: Vec<f64>,
}

/// Dollar-cost-averaging parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DcaParams {
    /// USD added per contribution; `0.0` disables DCA
    pub amount: f64,
    /// Contribute every `period` steps
    pub period: u32,
}

impl Default for DcaParams {
    fn default() -> Self {
        Self {
            amount: 0.0,
            period: 1,
        }
    }
}

impl DcaParams {
    /// DCA variants are simulated only for a positive amount.
    #[inline]
    pub fn enabled(&self) -> bool {
        self.amount > 0.0
    }

    /// Whether a contribution is due at 1-based step `count`.
    #[inline]
    pub fn is_contribution_step(&self, count: u64) -> bool {
        self.enabled() && self.period > 0 && count % u64::from(self.period) == 0
    }
}

/// All strategy parameters of one backtest.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrategyParams {
    pub rebalance: RebalanceParams,
    pub dca: DcaParams,
}

impl StrategyParams {
    /// Input validation applied before a run is requested.
    ///
    /// Stricter than what the engine needs: at most [`MAX_RULES`] distinct,
    /// positive periods and thresholds; a non-negative DCA amount with a
    /// period of at least 1.
    pub fn validate(&self) -> Result<()> {
        let r = &self.rebalance;
        if r.periods.len() > MAX_RULES {
            return Err(Error::InvalidParams(format!(
                "at most {MAX_RULES} rebalance periods, got {}",
                r.periods.len()
            )));
        }
        if r.thresholds.len() > MAX_RULES {
            return Err(Error::InvalidParams(format!(
                "at most {MAX_RULES} rebalance thresholds, got {}",
                r.thresholds.len()
            )));
        }
        for (i, p) in r.periods.iter().enumerate() {
            if *p == 0 {
                return Err(Error::InvalidParams("rebalance periods must be >= 1".into()));
            }
            if r.periods[..i].contains(p) {
                return Err(Error::InvalidParams(format!("duplicate rebalance period {p}")));
            }
        }
        for (i, t) in r.thresholds.iter().enumerate() {
            if !t.is_finite() || *t <= 0.0 {
                return Err(Error::InvalidParams(format!(
                    "rebalance threshold must be > 0, got {t}"
                )));
            }
            if r.thresholds[..i].contains(t) {
                return Err(Error::InvalidParams(format!("duplicate rebalance threshold {t}")));
            }
        }
        if !self.dca.amount.is_finite() || self.dca.amount < 0.0 {
            return Err(Error::InvalidParams(format!(
                "dca amount must be >= 0, got {}",
                self.dca.amount
            )));
        }
        if self.dca.period == 0 {
            return Err(Error::InvalidParams("dca period must be >= 1".into()));
        }
        Ok(())
    }

    /// Checks that would otherwise panic or loop inside the engine.
    pub(crate) fn check_runnable(&self) -> Result<()> {
        if self.rebalance.periods.contains(&0) {
            return Err(Error::InvalidParams("rebalance periods must be >= 1".into()));
        }
        if self.dca.enabled() && self.dca.period == 0 {
            return Err(Error::InvalidParams("dca period must be >= 1".into()));
        }
        Ok(())
    }
}

/// When a variant snaps its holdings back to target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Trigger {
    Never,
    /// Every `n`-th step, by step ordinal
    Every(u32),
    /// When drift reaches this many percentage points
    Drift(f64),
}

/// One simulated strategy.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "param", rename_all = "snake_case"))]
pub enum Variant {
    BuyAndHold,
    Dca,
    Period(u32),
    Threshold(f64),
    PeriodDca(u32),
    ThresholdDca(f64),
}

impl Variant {
    /// Receives DCA contributions.
    #[inline]
    pub fn has_dca(&self) -> bool {
        matches!(self, Variant::Dca | Variant::PeriodDca(_) | Variant::ThresholdDca(_))
    }

    #[inline]
    pub fn trigger(&self) -> Trigger {
        match *self {
            Variant::BuyAndHold | Variant::Dca => Trigger::Never,
            Variant::Period(p) | Variant::PeriodDca(p) => Trigger::Every(p),
            Variant::Threshold(t) | Variant::ThresholdDca(t) => Trigger::Drift(t),
        }
    }

    /// Threshold variants record which coins snapped at each step.
    #[inline]
    pub fn is_threshold(&self) -> bool {
        matches!(self.trigger(), Trigger::Drift(_))
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::BuyAndHold => write!(f, "buy_and_hold"),
            Variant::Dca => write!(f, "dca"),
            Variant::Period(p) => write!(f, "rebalanced_period_{p}"),
            Variant::Threshold(t) => write!(f, "rebalanced_threshold_{t}"),
            Variant::PeriodDca(p) => write!(f, "rebalanced_period_dca_{p}"),
            Variant::ThresholdDca(t) => write!(f, "rebalanced_threshold_dca_{t}"),
        }
    }
}

/// The ordered variants of one run.
///
/// Order: buy-and-hold, DCA, periods, thresholds, DCA periods, DCA
/// thresholds, each list in configured order. Every per-step record stores one
/// value per variant in this order, so a variant's position is its slot.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariantSet {
    variants: Vec<Variant>,
}

impl VariantSet {
    pub fn new(params: &StrategyParams) -> Self {
        let r = &params.rebalance;
        let dca = params.dca.enabled();

        let mut variants = Vec::with_capacity(2 + 2 * (r.periods.len() + r.thresholds.len()));
        variants.push(Variant::BuyAndHold);
        if dca {
            variants.push(Variant::Dca);
        }
        variants.extend(r.periods.iter().map(|&p| Variant::Period(p)));
        variants.extend(r.thresholds.iter().map(|&t| Variant::Threshold(t)));
        if dca {
            variants.extend(r.periods.iter().map(|&p| Variant::PeriodDca(p)));
            variants.extend(r.thresholds.iter().map(|&t| Variant::ThresholdDca(t)));
        }
        Self { variants }
    }

    /// Slot of `variant`, if it is part of this run.
    pub fn slot(&self, variant: Variant) -> Option<usize> {
        self.variants.iter().position(|v| *v == variant)
    }

    pub fn contains(&self, variant: Variant) -> bool {
        self.slot(variant).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = Variant> + '_ {
        self.variants.iter().copied()
    }

    pub fn as_slice(&self) -> &[Variant] {
        &self.variants
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(periods: &[u32], thresholds: &[f64], dca_amount: f64) -> StrategyParams {
        StrategyParams {
            rebalance: RebalanceParams {
                periods: periods.to_vec(),
                thresholds: thresholds.to_vec(),
            },
            dca: DcaParams {
                amount: dca_amount,
                period: 7,
            },
        }
    }

    #[test]
    fn variant_order_without_dca() {
        let set = VariantSet::new(&params(&[1, 7], &[5.0], 0.0));
        assert_eq!(
            set.as_slice(),
            &[
                Variant::BuyAndHold,
                Variant::Period(1),
                Variant::Period(7),
                Variant::Threshold(5.0),
            ]
        );
    }

    #[test]
    fn variant_order_with_dca() {
        let set = VariantSet::new(&params(&[7], &[5.0, 10.0], 100.0));
        assert_eq!(
            set.as_slice(),
            &[
                Variant::BuyAndHold,
                Variant::Dca,
                Variant::Period(7),
                Variant::Threshold(5.0),
                Variant::Threshold(10.0),
                Variant::PeriodDca(7),
                Variant::ThresholdDca(5.0),
                Variant::ThresholdDca(10.0),
            ]
        );
        assert_eq!(set.slot(Variant::PeriodDca(7)), Some(5));
        assert_eq!(set.slot(Variant::Period(14)), None);
    }

    #[test]
    fn variant_count_is_2_plus_2p_plus_2t() {
        let set = VariantSet::new(&params(&[1, 7, 14], &[1.0, 5.0, 10.0], 50.0));
        assert_eq!(set.len(), 2 + 2 * 3 + 2 * 3);
    }

    #[test]
    fn contribution_steps() {
        let dca = DcaParams {
            amount: 10.0,
            period: 3,
        };
        let due: Vec<u64> = (1..=9).filter(|&c| dca.is_contribution_step(c)).collect();
        assert_eq!(due, vec![3, 6, 9]);

        let off = DcaParams {
            amount: 0.0,
            period: 1,
        };
        assert!(!off.is_contribution_step(1));
    }

    #[test]
    fn variant_labels() {
        assert_eq!(Variant::BuyAndHold.to_string(), "buy_and_hold");
        assert_eq!(Variant::Period(7).to_string(), "rebalanced_period_7");
        assert_eq!(Variant::Threshold(5.0).to_string(), "rebalanced_threshold_5");
        assert_eq!(Variant::ThresholdDca(2.5).to_string(), "rebalanced_threshold_dca_2.5");
    }

    #[test]
    fn triggers() {
        assert_eq!(Variant::Dca.trigger(), Trigger::Never);
        assert_eq!(Variant::PeriodDca(7).trigger(), Trigger::Every(7));
        assert_eq!(Variant::Threshold(5.0).trigger(), Trigger::Drift(5.0));
        assert!(Variant::ThresholdDca(5.0).has_dca());
        assert!(!Variant::Period(1).has_dca());
    }

    #[test]
    fn validate_accepts_typical() {
        assert!(params(&[1, 7, 14], &[1.0, 5.0, 10.0], 100.0).validate().is_ok());
    }

    #[test]
    fn validate_rejects_too_many() {
        assert!(params(&[1, 2, 3, 4], &[], 0.0).validate().is_err());
        assert!(params(&[], &[1.0, 2.0, 3.0, 4.0], 0.0).validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicates_and_zero() {
        assert!(params(&[7, 7], &[], 0.0).validate().is_err());
        assert!(params(&[0], &[], 0.0).validate().is_err());
        assert!(params(&[], &[5.0, 5.0], 0.0).validate().is_err());
        assert!(params(&[], &[0.0], 0.0).validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_dca() {
        assert!(params(&[], &[], -1.0).validate().is_err());
        let mut p = params(&[], &[], 10.0);
        p.dca.period = 0;
        assert!(p.validate().is_err());
        assert!(p.check_runnable().is_err());
    }

    #[test]
    fn disabled_dca_with_zero_period_is_runnable() {
        let mut p = params(&[], &[], 0.0);
        p.dca.period = 0;
        assert!(p.check_runnable().is_ok());
    }
}
