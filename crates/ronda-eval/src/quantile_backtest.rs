//! Quantile-stratified backtest.
//!
//! Rows are bucketed by signal strength and the one-step-forward return of
//! each bucket is scored, without simulating trades. A synthetic long/short
//! series compares the top bucket against the bottom one.

use crate::align::align_with;
use crate::backtest::BacktestEngine;
use crate::ic::pearson;
use crate::quantile::{Buckets, check_quantiles, quantile_buckets};
use ndarray::ArrayView1;
use ronda_traits::stats::{mean, sample_std};
use ronda_traits::{FactorSignal, PriceBar, PriceTable, Result, RondaError, Timestamp};
use serde::{Deserialize, Serialize};

/// Label of the synthetic long/short bucket.
pub const LONG_SHORT_LABEL: &str = "LongShort";

/// How top-bucket and bottom-bucket returns are paired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LongShortMode {
    /// Top returns minus bottom returns, position by position in time
    /// order, truncated to the shorter bucket. The paired rows generally
    /// come from different timestamps.
    #[default]
    Truncated,
    /// Every top-bucket row contributes `+r` and every bottom-bucket row
    /// `-r`, merged in timestamp order. Each value belongs to one real
    /// timestamp, at the cost of mixing long and short legs in one series.
    Chronological,
}

/// Configuration for [`BacktestEngine::run_quantile_backtest_with`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantileBacktestConfig {
    /// Requested bucket count
    pub quantiles: usize,
    /// Whether to build the long/short series
    pub long_short: bool,
    /// Pairing of the long/short legs
    pub pairing: LongShortMode,
}

impl Default for QuantileBacktestConfig {
    fn default() -> Self {
        Self {
            quantiles: 5,
            long_short: true,
            pairing: LongShortMode::Truncated,
        }
    }
}

/// Forward-return statistics of one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantileBucketStats {
    /// `Q1` (lowest signal) to `Qk`, or `LongShort`
    pub label: String,
    /// Mean forward return
    pub mean_return: f64,
    /// Sample standard deviation of forward returns
    pub std_return: f64,
    /// Annualized Sharpe ratio of the forward returns
    pub sharpe_ratio: f64,
    /// Compounded forward return
    pub total_return: f64,
    /// Rows in the bucket
    pub count: usize,
}

/// Quantile backtest results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantileBacktestReport {
    /// Per-bucket statistics, lowest bucket first
    pub buckets: Vec<QuantileBucketStats>,
    /// Long/short statistics, when requested and at least two buckets formed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_short: Option<QuantileBucketStats>,
    /// Pairing used for the long/short series
    pub pairing: LongShortMode,
    /// Pearson correlation of signal and forward return over retained rows
    pub factor_ic: f64,
    /// Rows with a defined forward return
    pub observations: usize,
}

impl BacktestEngine {
    fn bucket_stats(&self, label: String, returns: &[f64]) -> QuantileBucketStats {
        QuantileBucketStats {
            label,
            mean_return: mean(returns),
            std_return: sample_std(returns),
            sharpe_ratio: self.analyzer().sharpe_ratio(returns),
            total_return: returns.iter().map(|r| 1.0 + r).product::<f64>() - 1.0,
            count: returns.len(),
        }
    }

    /// Quantile backtest with truncated long/short pairing.
    ///
    /// See [`BacktestEngine::run_quantile_backtest_with`].
    pub fn run_quantile_backtest(
        &self,
        signal: &FactorSignal,
        prices: &PriceTable,
        quantiles: usize,
        long_short: bool,
    ) -> Result<QuantileBacktestReport> {
        let config = QuantileBacktestConfig {
            quantiles,
            long_short,
            ..QuantileBacktestConfig::default()
        };
        self.run_quantile_backtest_with(signal, prices, &config)
    }

    /// Bucket rows by signal and score each bucket's forward returns.
    ///
    /// The signal is aligned with the close; the forward return of row `t`
    /// is `close[t+1] / close[t] - 1` over the aligned rows. The last row
    /// has no forward return and is dropped.
    ///
    /// # Errors
    ///
    /// - [`RondaError::InvalidConfig`] if `quantiles < 2`
    /// - [`RondaError::InsufficientData`] if fewer than `quantiles * 2` rows
    ///   align, or none has a defined forward return
    pub fn run_quantile_backtest_with(
        &self,
        signal: &FactorSignal,
        prices: &PriceTable,
        config: &QuantileBacktestConfig,
    ) -> Result<QuantileBacktestReport> {
        check_quantiles(config.quantiles)?;

        let rows = align_with(signal, prices, |s: &f64, bar: &PriceBar| {
            !s.is_nan() && !bar.close.is_nan()
        });
        if rows.len() < config.quantiles * 2 {
            return Err(RondaError::insufficient(format!(
                "quantile backtest needs at least {} aligned rows, got {}",
                config.quantiles * 2,
                rows.len()
            )));
        }

        let retained: Vec<(Timestamp, f64, f64)> = rows
            .windows(2)
            .filter_map(|w| {
                let (ts, value, bar) = w[0];
                let forward = w[1].2.close / bar.close - 1.0;
                (value.is_finite() && forward.is_finite()).then_some((ts, value, forward))
            })
            .collect();
        if retained.is_empty() {
            return Err(RondaError::insufficient("no rows with a defined forward return"));
        }

        let values: Vec<f64> = retained.iter().map(|r| r.1).collect();
        let forwards: Vec<f64> = retained.iter().map(|r| r.2).collect();
        let buckets = quantile_buckets(&values, config.quantiles)?;

        let mut grouped: Vec<Vec<f64>> = vec![Vec::new(); buckets.count];
        for (&b, &r) in buckets.labels.iter().zip(&forwards) {
            grouped[b].push(r);
        }
        let stats: Vec<QuantileBucketStats> = grouped
            .iter()
            .enumerate()
            .filter(|(_, g)| !g.is_empty())
            .map(|(b, g)| self.bucket_stats(Buckets::label(b), g))
            .collect();

        let long_short = (config.long_short && stats.len() >= 2)
            .then(|| {
                let top = buckets.count - 1;
                let spread = long_short_series(&retained, &buckets.labels, top, config.pairing);
                (!spread.is_empty()).then(|| self.bucket_stats(LONG_SHORT_LABEL.to_string(), &spread))
            })
            .flatten();

        Ok(QuantileBacktestReport {
            buckets: stats,
            long_short,
            pairing: config.pairing,
            factor_ic: pearson(
                ArrayView1::from(values.as_slice()),
                ArrayView1::from(forwards.as_slice()),
            ),
            observations: retained.len(),
        })
    }
}

/// Builds the long/short return series from bucket `top` and bucket 0.
fn long_short_series(
    rows: &[(Timestamp, f64, f64)],
    labels: &[usize],
    top: usize,
    pairing: LongShortMode,
) -> Vec<f64> {
    match pairing {
        LongShortMode::Truncated => {
            let leg = |bucket: usize| {
                rows.iter()
                    .zip(labels)
                    .filter(move |(_, b)| **b == bucket)
                    .map(|(r, _)| r.2)
            };
            leg(top).zip(leg(0)).map(|(high, low)| high - low).collect()
        }
        LongShortMode::Chronological => rows
            .iter()
            .zip(labels)
            .filter_map(|(r, &b)| match b {
                b if b == top => Some(r.2),
                0 => Some(-r.2),
                _ => None,
            })
            .collect(),
    }
}
