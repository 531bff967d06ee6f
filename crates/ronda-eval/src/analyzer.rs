//! Multi-horizon IC statistics and the comprehensive IC report.

use crate::align::align;
use crate::decay::{DecayAnalysis, ic_decay};
use crate::ic::{IcMethod, ic_of, ic_ir_of, rolling_ic_aligned};
use crate::quantile::{QuantileAnalysis, check_quantiles, quantile_rank_analysis};
use ronda_traits::stats::{mean, sample_std};
use ronda_traits::{FactorSignal, PriceTable, Result, RondaError, TimeSeries};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Default forecast horizons for [`IcAnalyzer::ic_stats`].
pub const DEFAULT_PERIODS: [usize; 5] = [1, 3, 5, 10, 20];

/// Configuration for IC analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcConfig {
    /// Correlation coefficient
    pub method: IcMethod,
    /// Window of the rolling IC behind `ic_mean`, `ic_std` and `ic_ir`
    pub rolling_window: usize,
    /// Rolling IC above this counts as positive, below its negation as negative
    pub threshold: f64,
    /// Windows summarized in the comprehensive report
    pub summary_windows: Vec<usize>,
    /// Longest horizon of the decay curve
    pub max_decay_period: usize,
    /// Bucket count for the rank analysis
    pub quantiles: usize,
}

impl Default for IcConfig {
    fn default() -> Self {
        Self {
            method: IcMethod::Pearson,
            rolling_window: 30,
            threshold: 0.02,
            summary_windows: vec![20, 60, 120],
            max_decay_period: 20,
            quantiles: 5,
        }
    }
}

impl IcConfig {
    /// Checks the configuration, failing on the first invalid value.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InvalidConfig`] describing the rejected field.
    pub fn validate(&self) -> Result<()> {
        if self.rolling_window < 2 {
            return Err(RondaError::config("rolling_window must be at least 2"));
        }
        if let Some(w) = self.summary_windows.iter().find(|&&w| w < 2) {
            return Err(RondaError::config(format!(
                "summary windows must be at least 2, got {w}"
            )));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(RondaError::config("threshold must be a non-negative number"));
        }
        if self.max_decay_period == 0 {
            return Err(RondaError::config("max_decay_period must be at least 1"));
        }
        check_quantiles(self.quantiles)
    }
}

/// IC statistics for one forecast horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IcRecord {
    /// IC over the full sample; NaN with fewer than two aligned points
    pub ic: f64,
    /// Mean rolling IC
    pub ic_mean: f64,
    /// Sample standard deviation of rolling IC
    pub ic_std: f64,
    /// `ic_mean / ic_std`
    pub ic_ir: f64,
    /// Share of rolling IC values above zero
    pub ic_win_rate: f64,
    /// Share of rolling IC values above the threshold
    pub ic_positive_rate: f64,
    /// Share of rolling IC values below the negated threshold
    pub ic_negative_rate: f64,
}

/// Summary of one rolling IC window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingIcSummary {
    /// Window length
    pub window: usize,
    /// Mean rolling IC
    pub mean: f64,
    /// Sample standard deviation of rolling IC
    pub std: f64,
    /// Smallest rolling IC
    pub min: f64,
    /// Largest rolling IC
    pub max: f64,
    /// Share of rolling IC values above zero
    pub win_rate: f64,
}

fn share(values: &[f64], pred: impl Fn(f64) -> bool) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().filter(|&&v| pred(v)).count() as f64 / values.len() as f64
}

impl RollingIcSummary {
    fn from_values(window: usize, values: &[f64]) -> Self {
        let min = values.iter().copied().fold(f64::NAN, f64::min);
        let max = values.iter().copied().fold(f64::NAN, f64::max);
        Self {
            window,
            mean: mean(values),
            std: sample_std(values),
            min,
            max,
            win_rate: share(values, |v| v > 0.0),
        }
    }
}

/// Comprehensive IC report for one factor.
#[derive(Debug, Clone, Serialize)]
pub struct IcReport {
    /// Correlation coefficient used throughout
    pub method: IcMethod,
    /// Aligned rows between the signal and single-period returns
    pub observations: usize,
    /// IC statistics keyed by forecast horizon
    pub ic_stats: BTreeMap<usize, IcRecord>,
    /// Rolling IC summaries, one per configured window
    pub rolling: Vec<RollingIcSummary>,
    /// IC by horizon with half-life and peak
    pub decay: DecayAnalysis,
    /// Bucketed return comparison
    pub quantile: QuantileAnalysis,
}

/// Correlation engine over a configurable method and windows.
///
/// Stateless: one analyzer can serve many factors concurrently.
#[derive(Debug, Clone, Default)]
pub struct IcAnalyzer {
    config: IcConfig,
}

impl IcAnalyzer {
    /// Create a new analyzer.
    pub const fn new(config: IcConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub const fn config(&self) -> &IcConfig {
        &self.config
    }

    /// IC statistics for one horizon, `target` already shifted forward.
    fn record(&self, signal: &FactorSignal, forward: &TimeSeries<f64>) -> IcRecord {
        let pair = align(signal, forward);
        let rolling = rolling_ic_aligned(&pair, self.config.rolling_window, self.config.method);
        let values = rolling.values();
        let threshold = self.config.threshold;

        IcRecord {
            ic: ic_of(pair.signal.view(), pair.target.view(), self.config.method),
            ic_mean: mean(values),
            ic_std: sample_std(values),
            ic_ir: ic_ir_of(values),
            ic_win_rate: share(values, |v| v > 0.0),
            ic_positive_rate: share(values, |v| v > threshold),
            ic_negative_rate: share(values, |v| v < -threshold),
        }
    }

    /// IC statistics per forecast horizon.
    ///
    /// For each `h` in `periods`, the target is shifted back by `h` steps so
    /// the value at `t` is the target observed `h` steps later, then IC,
    /// rolling-IC moments, IC_IR and the win/positive/negative rates are
    /// computed against it.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InvalidConfig`] for an invalid configuration or
    /// a horizon of 0.
    pub fn ic_stats(
        &self,
        signal: &FactorSignal,
        target: &TimeSeries<f64>,
        periods: &[usize],
    ) -> Result<BTreeMap<usize, IcRecord>> {
        self.config.validate()?;
        if periods.contains(&0) {
            return Err(RondaError::config("forecast horizons must be at least 1"));
        }
        Ok(periods
            .iter()
            .map(|&h| (h, self.record(signal, &target.shift(-(h as isize)))))
            .collect())
    }

    /// Rolling IC summaries for the configured windows.
    pub fn rolling_summaries(&self, signal: &FactorSignal, target: &TimeSeries<f64>) -> Vec<RollingIcSummary> {
        let pair = align(signal, target);
        self.config
            .summary_windows
            .iter()
            .map(|&w| {
                let rolling = rolling_ic_aligned(&pair, w, self.config.method);
                if rolling.is_empty() {
                    debug!(window = w, rows = pair.len(), "rolling window longer than sample");
                }
                RollingIcSummary::from_values(w, rolling.values())
            })
            .collect()
    }

    /// Full predictive-power report for a factor against a price table.
    ///
    /// The target is the single-period simple return of `close`. The report
    /// holds [`IcAnalyzer::ic_stats`] for `periods`, rolling summaries, the
    /// decay curve and the quantile rank analysis.
    ///
    /// # Errors
    ///
    /// - [`RondaError::InvalidConfig`] for an invalid configuration
    /// - [`RondaError::InsufficientData`] if the signal and returns share
    ///   fewer rows than the rank analysis needs
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use ronda_eval::{DEFAULT_PERIODS, IcAnalyzer};
    ///
    /// let report = IcAnalyzer::default().comprehensive_analysis(&signal, &prices, &DEFAULT_PERIODS)?;
    /// for (h, record) in &report.ic_stats {
    ///     println!("{h}: ic={:.4} ir={:.2}", record.ic, record.ic_ir);
    /// }
    /// ```
    pub fn comprehensive_analysis(
        &self,
        signal: &FactorSignal,
        prices: &PriceTable,
        periods: &[usize],
    ) -> Result<IcReport> {
        self.config.validate()?;
        let returns = prices.close().pct_change();

        let observations = align(signal, &returns).len();
        let needed = (self.config.quantiles * 2).max(2);
        if observations < needed {
            return Err(RondaError::insufficient(format!(
                "IC analysis needs at least {needed} rows aligned with returns, got {observations}"
            )));
        }

        let ic_stats = self.ic_stats(signal, &returns, periods)?;
        let rolling = self.rolling_summaries(signal, &returns);
        let decay = ic_decay(signal, &returns, self.config.max_decay_period, self.config.method)?;
        let quantile = quantile_rank_analysis(signal, &returns, self.config.quantiles)?;

        Ok(IcReport {
            method: self.config.method,
            observations,
            ic_stats,
            rolling,
            decay: DecayAnalysis::from_series(decay),
            quantile,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn noisy_returns(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| ((i * 37 % 17) as f64 - 8.0) / 400.0)
            .collect()
    }

    #[test]
    fn test_ic_stats_perfect_one_step_predictor() {
        let returns = noisy_returns(80);
        // The signal at t equals the target at t + 1.
        let signal: Vec<f64> = (0..80)
            .map(|i| returns.get(i + 1).copied().unwrap_or(f64::NAN))
            .collect();

        let analyzer = IcAnalyzer::new(IcConfig {
            rolling_window: 10,
            ..IcConfig::default()
        });
        let stats = analyzer
            .ic_stats(
                &TimeSeries::from_values(signal),
                &TimeSeries::from_values(returns),
                &[1, 3],
            )
            .unwrap();

        let one = stats[&1];
        assert_relative_eq!(one.ic, 1.0, epsilon = 1e-10);
        assert_relative_eq!(one.ic_mean, 1.0, epsilon = 1e-10);
        assert_eq!(one.ic_win_rate, 1.0);
        assert_eq!(one.ic_positive_rate, 1.0);
        assert_eq!(one.ic_negative_rate, 0.0);
        assert!(stats[&3].ic < 1.0);
    }

    #[test]
    fn test_ic_stats_rejects_zero_horizon() {
        let s = TimeSeries::from_values(vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            IcAnalyzer::default().ic_stats(&s, &s, &[0]),
            Err(RondaError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_short_sample_has_nan_rolling_stats() {
        let s = TimeSeries::from_values(vec![1.0, 2.0, 3.0, 4.0]);
        let t = TimeSeries::from_values(vec![0.1, 0.3, 0.2, 0.4]);
        let stats = IcAnalyzer::default().ic_stats(&s, &t, &[1]).unwrap();
        let r = stats[&1];
        assert!(r.ic.is_finite());
        assert!(r.ic_mean.is_nan());
        assert!(r.ic_ir.is_nan());
        assert!(r.ic_win_rate.is_nan());
    }

    #[test]
    fn test_comprehensive_analysis() {
        let closes: Vec<f64> = (0..200u32)
            .scan(100.0, |p, i| {
                let x = f64::from(i);
                *p *= 1.0 + ((x * 1.7).sin() + (x * 0.31).cos()) / 100.0;
                Some(*p)
            })
            .collect();
        let prices = PriceTable::from_closes(&closes);
        let signal = prices.close().pct_change().shift(-1);

        let report = IcAnalyzer::default()
            .comprehensive_analysis(&signal, &prices, &DEFAULT_PERIODS)
            .unwrap();

        assert_eq!(report.ic_stats.len(), 5);
        assert_relative_eq!(report.ic_stats[&1].ic, 1.0, epsilon = 1e-10);
        assert_eq!(report.rolling.len(), 3);
        assert_eq!(report.rolling[2].window, 120);
        assert_eq!(report.decay.curve.len(), 20);
        assert_eq!(report.decay.peak.map(|p| p.0), Some(1));
        assert!(!report.quantile.quantile_returns.is_empty());
    }

    #[test]
    fn test_comprehensive_analysis_insufficient() {
        let prices = PriceTable::from_closes(&[100.0, 101.0, 102.0]);
        let signal = TimeSeries::from_values(vec![0.1, 0.2, 0.3]);
        assert!(matches!(
            IcAnalyzer::default().comprehensive_analysis(&signal, &prices, &[1]),
            Err(RondaError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_config_validation() {
        let config = IcConfig {
            quantiles: 1,
            ..IcConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(IcConfig::default().validate().is_ok());
    }
}
