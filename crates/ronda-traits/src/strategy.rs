//! Decision rules for the backtest engine.

use crate::PriceBar;
use serde::{Deserialize, Serialize};

/// Maps a signal observation to a trade decision.
///
/// A positive return value buys that many units, a negative one sells,
/// zero holds. Any closure `Fn(f64, &PriceBar, usize) -> f64` is a rule.
///
/// # Example
///
/// ```
/// use ronda_traits::{PriceBar, StrategyRule};
///
/// let contrarian = |signal: f64, _bar: &PriceBar, _step: usize| -signal.signum();
/// assert_eq!(contrarian.decide(0.5, &PriceBar::from_close(10.0), 1), -1.0);
/// ```
pub trait StrategyRule {
    /// Decides the trade for one step.
    ///
    /// # Arguments
    ///
    /// * `signal` - The factor value observed at this step
    /// * `bar` - The price bar at this step
    /// * `step` - Position of this step in the aligned run (the anchor row is 0)
    fn decide(&self, signal: f64, bar: &PriceBar, step: usize) -> f64;
}

impl<F> StrategyRule for F
where
    F: Fn(f64, &PriceBar, usize) -> f64,
{
    fn decide(&self, signal: f64, bar: &PriceBar, step: usize) -> f64 {
        self(signal, bar, step)
    }
}

/// Buys above an upper threshold and sells below a lower one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdStrategy {
    /// Signal level above which the rule buys.
    pub upper: f64,
    /// Signal level below which the rule sells.
    pub lower: f64,
    /// Units traded per decision.
    pub size: f64,
}

impl Default for ThresholdStrategy {
    fn default() -> Self {
        Self {
            upper: 0.02,
            lower: -0.02,
            size: 1.0,
        }
    }
}

impl StrategyRule for ThresholdStrategy {
    fn decide(&self, signal: f64, _bar: &PriceBar, _step: usize) -> f64 {
        if signal > self.upper {
            self.size
        } else if signal < self.lower {
            -self.size
        } else {
            0.0
        }
    }
}
