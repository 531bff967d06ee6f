//! Risk and performance metrics over a return stream.
//!
//! Every metric is a pure function of the returns, so the same analyzer
//! scores a backtest equity curve, a quantile bucket or an external series.

use crate::align::align;
use ronda_traits::stats::{
    is_degenerate, kurtosis, mean, population_variance, quantile, sample_covariance, sample_std, skewness,
};
use ronda_traits::{Result, RondaError, TimeSeries, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Configuration for performance analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Annual risk-free rate
    pub risk_free_rate: f64,
    /// Return observations per year, used for annualization
    pub periods_per_year: f64,
    /// Tail probability for VaR and CVaR
    pub var_confidence: f64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.02,
            periods_per_year: 252.0,
            var_confidence: 0.05,
        }
    }
}

impl PerformanceConfig {
    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InvalidConfig`] describing the rejected field.
    pub fn validate(&self) -> Result<()> {
        if !(self.periods_per_year.is_finite() && self.periods_per_year > 0.0) {
            return Err(RondaError::config("periods_per_year must be positive"));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(RondaError::config("risk_free_rate must be finite"));
        }
        if !(self.var_confidence > 0.0 && self.var_confidence < 1.0) {
            return Err(RondaError::config("var_confidence must lie in (0, 1)"));
        }
        Ok(())
    }
}

/// Running product of `(1 + r)` minus one.
pub fn cumulative_returns(returns: &TimeSeries<f64>) -> TimeSeries<f64> {
    let mut growth = 1.0;
    returns.map(|r| {
        growth *= 1.0 + r;
        growth - 1.0
    })
}

/// Compounded return over the whole slice. NaN if empty.
pub fn total_return(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return f64::NAN;
    }
    returns.iter().map(|r| 1.0 + r).product::<f64>() - 1.0
}

/// Annualized mean return.
pub fn annual_return(returns: &[f64], periods_per_year: f64) -> f64 {
    mean(returns) * periods_per_year
}

/// Annualized sample standard deviation.
pub fn volatility(returns: &[f64], periods_per_year: f64) -> f64 {
    sample_std(returns) * periods_per_year.sqrt()
}

/// Calculate the annualized Sharpe ratio.
///
/// `(mean * P - rf) / (std * sqrt(P))`; NaN if the slice is empty or its
/// standard deviation is zero.
///
/// # Example
///
/// ```rust,ignore
/// use ronda_eval::performance::sharpe_ratio;
///
/// let sharpe = sharpe_ratio(&daily_returns, 0.02, 252.0);
/// ```
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    if returns.is_empty() {
        return f64::NAN;
    }
    let std = sample_std(returns);
    if is_degenerate(std) {
        return f64::NAN;
    }
    (annual_return(returns, periods_per_year) - risk_free_rate) / (std * periods_per_year.sqrt())
}

/// Sortino ratio: Sharpe with the standard deviation of losing periods only.
///
/// NaN when fewer than two returns are negative or they are all equal.
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    let std = sample_std(&downside);
    if is_degenerate(std) {
        return f64::NAN;
    }
    (annual_return(returns, periods_per_year) - risk_free_rate) / (std * periods_per_year.sqrt())
}

/// Deepest peak-to-trough decline of the cumulative return curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaxDrawdown {
    /// Most negative drawdown, as a fraction of peak wealth
    pub max_drawdown: f64,
    /// Timestamp of the peak preceding the trough
    pub peak: Option<Timestamp>,
    /// Timestamp of the trough
    pub trough: Option<Timestamp>,
    /// Peak-to-trough distance: steps for ordinal indexes, days for calendar ones
    pub duration: Option<i64>,
    /// Drawdown at every point
    pub drawdown: TimeSeries<f64>,
}

/// Calculate the maximum drawdown of a return stream.
///
/// The cumulative return curve is compared against its expanding maximum:
/// `drawdown = (cum - running_max) / (1 + running_max)`. The trough is the
/// first minimum of that series and the peak the first maximum of the
/// cumulative curve at or before it.
pub fn max_drawdown(returns: &TimeSeries<f64>) -> MaxDrawdown {
    let cumulative = cumulative_returns(returns);
    let mut running_max = f64::NEG_INFINITY;
    let drawdown = cumulative.map(|&c| {
        running_max = running_max.max(c);
        (c - running_max) / (1.0 + running_max)
    });

    let trough = drawdown
        .values()
        .iter()
        .enumerate()
        .filter(|(_, d)| !d.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, &d)| match best {
            Some((_, b)) if b <= d => best,
            _ => Some((i, d)),
        });

    let Some((trough_pos, max_dd)) = trough else {
        return MaxDrawdown {
            max_drawdown: f64::NAN,
            peak: None,
            trough: None,
            duration: None,
            drawdown,
        };
    };

    let peak_pos = cumulative.values()[..=trough_pos]
        .iter()
        .enumerate()
        .fold(0, |best, (i, &c)| if c > cumulative.values()[best] { i } else { best });

    let index = returns.index();
    let (peak, trough) = (index[peak_pos], index[trough_pos]);
    MaxDrawdown {
        max_drawdown: max_dd,
        peak: Some(peak),
        trough: Some(trough),
        duration: peak.span_to(&trough),
        drawdown,
    }
}

/// Calmar ratio: annualized mean return over |max drawdown|.
///
/// NaN when the max drawdown is zero or undefined.
pub fn calmar_ratio(returns: &[f64], max_drawdown: f64, periods_per_year: f64) -> f64 {
    if max_drawdown == 0.0 || max_drawdown.is_nan() {
        return f64::NAN;
    }
    annual_return(returns, periods_per_year) / max_drawdown.abs()
}

/// Fraction of returns above zero. NaN if empty.
pub fn win_rate(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return f64::NAN;
    }
    returns.iter().filter(|r| **r > 0.0).count() as f64 / returns.len() as f64
}

/// Mean gain over absolute mean loss.
///
/// NaN when there are no gains, no losses, or the mean loss is zero.
pub fn profit_loss_ratio(returns: &[f64]) -> f64 {
    let gains: Vec<f64> = returns.iter().copied().filter(|r| *r > 0.0).collect();
    let losses: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    if gains.is_empty() || losses.is_empty() {
        return f64::NAN;
    }
    let avg_loss = mean(&losses).abs();
    if avg_loss == 0.0 {
        return f64::NAN;
    }
    mean(&gains) / avg_loss
}

/// Historical Value-at-Risk: the `confidence` quantile of returns.
pub fn value_at_risk(returns: &[f64], confidence: f64) -> f64 {
    quantile(returns, confidence)
}

/// Conditional VaR: mean of the returns at or below [`value_at_risk`].
pub fn conditional_value_at_risk(returns: &[f64], confidence: f64) -> f64 {
    let var = value_at_risk(returns, confidence);
    let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= var).collect();
    mean(&tail)
}

/// Mean over standard deviation of active return against a benchmark.
///
/// Computed over the timestamp-aligned rows; NaN with fewer than two rows or
/// a constant active return.
pub fn information_ratio(returns: &TimeSeries<f64>, benchmark: &TimeSeries<f64>) -> f64 {
    let pair = align(returns, benchmark);
    let excess = (&pair.signal - &pair.target).to_vec();
    let std = sample_std(&excess);
    if is_degenerate(std) {
        return f64::NAN;
    }
    mean(&excess) / std
}

/// Sensitivity to a benchmark: `Cov(r, b) / Var(b)` over the aligned rows.
///
/// The covariance uses the N-1 denominator and the benchmark variance the
/// N denominator, so beta is scaled by `n / (n - 1)` against the
/// both-sample estimate.
pub fn beta(returns: &TimeSeries<f64>, benchmark: &TimeSeries<f64>) -> f64 {
    let pair = align(returns, benchmark);
    let (r, b) = (pair.signal.to_vec(), pair.target.to_vec());
    if b.len() < 2 {
        return f64::NAN;
    }
    let var = population_variance(&b);
    if is_degenerate(var.sqrt()) {
        return f64::NAN;
    }
    sample_covariance(&r, &b) / var
}

/// The fixed set of risk/return statistics for one return stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    /// Compounded return over the period
    pub total_return: f64,
    /// Annualized mean return
    pub annual_return: f64,
    /// Annualized volatility
    pub volatility: f64,
    /// Annualized Sharpe ratio
    pub sharpe_ratio: f64,
    /// Annualized Sortino ratio
    pub sortino_ratio: f64,
    /// Calmar ratio
    pub calmar_ratio: f64,
    /// Maximum drawdown (negative)
    pub max_drawdown: f64,
    /// Peak-to-trough duration of the maximum drawdown
    pub max_drawdown_duration: Option<i64>,
    /// Peak of the maximum drawdown
    pub max_drawdown_peak: Option<Timestamp>,
    /// Trough of the maximum drawdown
    pub max_drawdown_trough: Option<Timestamp>,
    /// Fraction of positive returns
    pub win_rate: f64,
    /// Mean gain over absolute mean loss
    pub profit_loss_ratio: f64,
    /// Bias-corrected skewness
    pub skewness: f64,
    /// Bias-corrected excess kurtosis
    pub kurtosis: f64,
    /// Value-at-Risk at the configured confidence
    pub var: f64,
    /// Conditional Value-at-Risk at the configured confidence
    pub cvar: f64,
    /// Information ratio against the benchmark, when one was usable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub information_ratio: Option<f64>,
    /// Beta against the benchmark, when one was usable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    /// Cumulative return curve
    pub cumulative_returns: TimeSeries<f64>,
    /// Drawdown curve
    pub drawdown: TimeSeries<f64>,
}

/// Rolling risk metrics, each defined only for full windows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingMetrics {
    /// Window length
    pub window: usize,
    /// Rolling annualized Sharpe ratio
    pub sharpe_ratio: TimeSeries<f64>,
    /// Rolling annualized volatility
    pub volatility: TimeSeries<f64>,
    /// Rolling maximum drawdown
    pub max_drawdown: TimeSeries<f64>,
}

/// Turns return streams into [`PerformanceReport`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceAnalyzer {
    config: PerformanceConfig,
}

impl PerformanceAnalyzer {
    /// Create a new analyzer.
    pub const fn new(config: PerformanceConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub const fn config(&self) -> &PerformanceConfig {
        &self.config
    }

    /// Sharpe ratio under this analyzer's risk-free rate and annualization.
    pub fn sharpe_ratio(&self, returns: &[f64]) -> f64 {
        sharpe_ratio(returns, self.config.risk_free_rate, self.config.periods_per_year)
    }

    /// Compute every metric for `returns`.
    ///
    /// Missing (NaN) returns are dropped first. Benchmark metrics are only
    /// included when `benchmark` shares at least two rows with the returns;
    /// otherwise they are skipped with a warning and the rest of the report
    /// is still produced.
    ///
    /// # Errors
    ///
    /// - [`RondaError::InvalidConfig`] for an invalid configuration
    /// - [`RondaError::InsufficientData`] if no returns remain
    pub fn comprehensive_analysis(
        &self,
        returns: &TimeSeries<f64>,
        benchmark: Option<&TimeSeries<f64>>,
    ) -> Result<PerformanceReport> {
        self.config.validate()?;
        let returns = returns.dropna();
        if returns.is_empty() {
            return Err(RondaError::insufficient("no returns to analyze"));
        }

        let r = returns.values();
        let p = self.config.periods_per_year;
        let rf = self.config.risk_free_rate;
        let dd = max_drawdown(&returns);

        let (information_ratio, beta) = match benchmark {
            Some(b) => {
                let overlap = align(&returns, b).len();
                if overlap >= 2 {
                    (
                        Some(information_ratio(&returns, b)),
                        Some(self::beta(&returns, b)),
                    )
                } else {
                    warn!(overlap, "benchmark shares too few rows with returns, skipping relative metrics");
                    (None, None)
                }
            }
            None => (None, None),
        };

        Ok(PerformanceReport {
            total_return: total_return(r),
            annual_return: annual_return(r, p),
            volatility: volatility(r, p),
            sharpe_ratio: sharpe_ratio(r, rf, p),
            sortino_ratio: sortino_ratio(r, rf, p),
            calmar_ratio: calmar_ratio(r, dd.max_drawdown, p),
            max_drawdown: dd.max_drawdown,
            max_drawdown_duration: dd.duration,
            max_drawdown_peak: dd.peak,
            max_drawdown_trough: dd.trough,
            win_rate: win_rate(r),
            profit_loss_ratio: profit_loss_ratio(r),
            skewness: skewness(r),
            kurtosis: kurtosis(r),
            var: value_at_risk(r, self.config.var_confidence),
            cvar: conditional_value_at_risk(r, self.config.var_confidence),
            information_ratio,
            beta,
            cumulative_returns: cumulative_returns(&returns),
            drawdown: dd.drawdown,
        })
    }

    /// Rolling Sharpe ratio, volatility and maximum drawdown.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InvalidConfig`] if `window < 2`.
    pub fn rolling_analysis(&self, returns: &TimeSeries<f64>, window: usize) -> Result<RollingMetrics> {
        self.config.validate()?;
        if window < 2 {
            return Err(RondaError::config(format!(
                "rolling window must be at least 2, got {window}"
            )));
        }
        let returns = returns.dropna();
        let p = self.config.periods_per_year;

        let mut sharpe = TimeSeries::empty();
        let mut vol = TimeSeries::empty();
        let mut mdd = TimeSeries::empty();
        if returns.len() >= window {
            let values = returns.values();
            for end in window..=returns.len() {
                let slice = &values[end - window..end];
                let ts = returns.index()[end - 1];
                let window_series = TimeSeries::from_values(slice.to_vec());
                sharpe.push(ts, sharpe_ratio(slice, self.config.risk_free_rate, p))?;
                vol.push(ts, volatility(slice, p))?;
                mdd.push(ts, max_drawdown(&window_series).max_drawdown)?;
            }
        }

        Ok(RollingMetrics {
            window,
            sharpe_ratio: sharpe,
            volatility: vol,
            max_drawdown: mdd,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn series(values: &[f64]) -> TimeSeries<f64> {
        TimeSeries::from_values(values.to_vec())
    }

    /// Returns whose cumulative curve is exactly `curve`.
    fn returns_for_curve(curve: &[f64]) -> Vec<f64> {
        let mut prev = 1.0;
        curve
            .iter()
            .map(|c| {
                let r = (1.0 + c) / prev - 1.0;
                prev = 1.0 + c;
                r
            })
            .collect()
    }

    #[test]
    fn test_cumulative_returns() {
        let cum = cumulative_returns(&series(&[0.1, -0.1, 0.05]));
        assert_relative_eq!(cum.values()[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(cum.values()[1], -0.01, epsilon = 1e-12);
        assert_relative_eq!(cum.values()[2], 0.99 * 1.05 - 1.0, epsilon = 1e-12);
        assert_relative_eq!(total_return(&[0.1, -0.1, 0.05]), 0.99 * 1.05 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sharpe_zero_volatility_is_nan() {
        assert!(sharpe_ratio(&[0.0; 10], 0.02, 252.0).is_nan());
        assert!(sharpe_ratio(&[], 0.02, 252.0).is_nan());
    }

    #[test]
    fn test_sharpe_ratio_value() {
        let r = [0.01, -0.005, 0.02, 0.0, 0.005];
        let expected = (mean(&r) * 252.0 - 0.02) / (sample_std(&r) * 252f64.sqrt());
        assert_relative_eq!(sharpe_ratio(&r, 0.02, 252.0), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_sortino_needs_negative_returns() {
        assert!(sortino_ratio(&[0.01, 0.02, 0.03], 0.02, 252.0).is_nan());
        let r = [0.02, -0.01, 0.03, -0.03];
        let expected = (mean(&r) * 252.0 - 0.02) / (sample_std(&[-0.01, -0.03]) * 252f64.sqrt());
        assert_relative_eq!(sortino_ratio(&r, 0.02, 252.0), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_max_drawdown_expanding_maximum() {
        let returns = series(&returns_for_curve(&[0.0, 0.1, -0.05, 0.2]));
        let dd = max_drawdown(&returns);

        // Trough at -0.05 after a peak of 0.1: (-0.05 - 0.1) / 1.1.
        assert_relative_eq!(dd.max_drawdown, -0.15 / 1.1, epsilon = 1e-12);
        assert_eq!(dd.peak, Some(Timestamp::Ordinal(1)));
        assert_eq!(dd.trough, Some(Timestamp::Ordinal(2)));
        assert_eq!(dd.duration, Some(1));
        assert_eq!(dd.drawdown.values()[3], 0.0);
    }

    #[test]
    fn test_max_drawdown_duration_in_days() {
        let index = [1, 4, 9]
            .iter()
            .map(|&d| Timestamp::from(NaiveDate::from_ymd_opt(2024, 1, d).unwrap()))
            .collect();
        let returns = TimeSeries::new(index, vec![0.1, -0.02, -0.03]).unwrap();
        let dd = max_drawdown(&returns);
        assert_eq!(dd.duration, Some(8));
    }

    #[test]
    fn test_max_drawdown_of_rising_curve_is_zero() {
        let dd = max_drawdown(&series(&[0.01, 0.02, 0.03]));
        assert_eq!(dd.max_drawdown, 0.0);
        assert!(calmar_ratio(&[0.01, 0.02, 0.03], dd.max_drawdown, 252.0).is_nan());
    }

    #[test]
    fn test_win_rate_and_profit_loss() {
        let r = [0.02, -0.01, 0.04, -0.03, 0.0];
        assert_relative_eq!(win_rate(&r), 0.4);
        assert_relative_eq!(profit_loss_ratio(&r), 0.03 / 0.02, epsilon = 1e-12);
        assert!(profit_loss_ratio(&[0.01, 0.02]).is_nan());
    }

    #[test]
    fn test_var_and_cvar() {
        let r: Vec<f64> = (1..=20).map(|i| f64::from(i) / 100.0 - 0.1).collect();
        let var = value_at_risk(&r, 0.05);
        // 5th percentile of -0.09..=0.10 by linear interpolation.
        assert_relative_eq!(var, -0.0855, epsilon = 1e-12);
        assert_relative_eq!(conditional_value_at_risk(&r, 0.05), -0.09, epsilon = 1e-12);
    }

    #[test]
    fn test_benchmark_metrics() {
        let bench = series(&[0.01, -0.02, 0.015, 0.005, -0.01]);
        let strat = bench.map(|b| 2.0 * b);
        // Sample covariance over population variance: 2 * n / (n - 1).
        assert_relative_eq!(beta(&strat, &bench), 2.0 * 5.0 / 4.0, epsilon = 1e-12);

        let bench = series(&[0.01, -0.02, 0.03, 0.0]);
        let strat = bench.map(|b| 2.0 * b);
        assert_relative_eq!(beta(&strat, &bench), 8.0 / 3.0, epsilon = 1e-12);
        assert!(beta(&series(&[0.01]), &series(&[0.02])).is_nan());

        let ir = information_ratio(&strat, &bench);
        let excess = bench.values().to_vec();
        assert_relative_eq!(ir, mean(&excess) / sample_std(&excess), epsilon = 1e-12);
    }

    #[test]
    fn test_comprehensive_analysis() {
        let analyzer = PerformanceAnalyzer::default();
        let returns = series(&[0.01, -0.02, 0.015, f64::NAN, 0.005, -0.01]);

        let report = analyzer.comprehensive_analysis(&returns, None).unwrap();
        assert_eq!(report.cumulative_returns.len(), 5);
        assert!(report.information_ratio.is_none());
        assert!(report.max_drawdown < 0.0);
        assert_relative_eq!(report.win_rate, 0.6);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("beta").is_none());
        assert!(json.get("sharpe_ratio").is_some());
    }

    #[test]
    fn test_comprehensive_analysis_with_benchmark() {
        let analyzer = PerformanceAnalyzer::default();
        let returns = series(&[0.01, -0.02, 0.015, 0.005]);
        let bench = series(&[0.005, -0.01, 0.01, 0.0]);
        let report = analyzer.comprehensive_analysis(&returns, Some(&bench)).unwrap();
        assert!(report.beta.is_some());
        assert!(report.information_ratio.is_some());

        let disjoint = TimeSeries::new(vec![Timestamp::Ordinal(100)], vec![0.01]).unwrap();
        let report = analyzer.comprehensive_analysis(&returns, Some(&disjoint)).unwrap();
        assert!(report.beta.is_none());
    }

    #[test]
    fn test_comprehensive_analysis_empty_is_error() {
        let analyzer = PerformanceAnalyzer::default();
        assert!(matches!(
            analyzer.comprehensive_analysis(&series(&[f64::NAN]), None),
            Err(RondaError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_rolling_analysis() {
        let analyzer = PerformanceAnalyzer::default();
        let returns = series(&[0.01, -0.02, 0.015, 0.005, -0.01, 0.02]);
        let rolling = analyzer.rolling_analysis(&returns, 4).unwrap();
        assert_eq!(rolling.sharpe_ratio.len(), 3);
        assert_eq!(rolling.max_drawdown.index()[0], Timestamp::Ordinal(3));
        assert!(analyzer.rolling_analysis(&returns, 1).is_err());
    }

    #[test]
    fn test_rolling_analysis_window_values() {
        let analyzer = PerformanceAnalyzer::default();
        let returns = series(&[0.01, -0.02, 0.015, 0.005, -0.01, 0.02]);
        let rolling = analyzer.rolling_analysis(&returns, 4).unwrap();

        // First window [0.01, -0.02, 0.015, 0.005]: mean 0.0025, variance 7.25e-4 / 3.
        let vol = 0.0609_f64.sqrt();
        assert_relative_eq!(rolling.volatility.values()[0], vol, epsilon = 1e-12);
        assert_relative_eq!(rolling.sharpe_ratio.values()[0], 0.61 / vol, epsilon = 1e-9);
        // Peak 0.01 after day one, trough -0.0102 after day two.
        assert_relative_eq!(rolling.max_drawdown.values()[0], -0.02, epsilon = 1e-12);

        // Last window [0.015, 0.005, -0.01, 0.02]: mean 0.0075, variance 1.75e-4.
        assert_relative_eq!(rolling.volatility.values()[2], 0.21, epsilon = 1e-12);
        assert_relative_eq!(rolling.sharpe_ratio.values()[2], 1.87 / 0.21, epsilon = 1e-9);
        assert_relative_eq!(rolling.max_drawdown.values()[2], -0.01, epsilon = 1e-12);
        assert_eq!(rolling.volatility.index()[2], Timestamp::Ordinal(5));
    }
}
