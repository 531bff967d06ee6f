//! Equal-population bucketing of a signal and per-bucket return analysis.

use crate::align::align;
use ronda_traits::stats::{mean, quantile_sorted};
use ronda_traits::{FactorSignal, Result, RondaError, TimeSeries};
use serde::Serialize;
use tracing::debug;

/// Bucket assignment produced by [`quantile_buckets`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buckets {
    /// Zero-based bucket of each input value, in input order.
    pub labels: Vec<usize>,
    /// Number of distinct buckets actually formed.
    pub count: usize,
}

impl Buckets {
    /// Display label of bucket `b`: `Q1` is the lowest.
    pub fn label(b: usize) -> String {
        format!("Q{}", b + 1)
    }
}

/// Splits `values` into up to `quantiles` equal-population buckets.
///
/// Bucket edges are the linearly interpolated `i / quantiles` quantiles.
/// Repeated edges are merged, so heavily tied data may yield fewer buckets
/// than requested. Bins are closed on the right, and the lowest edge is
/// included in the first bin. Constant input forms a single bucket.
///
/// # Errors
///
/// Returns [`RondaError::InvalidConfig`] if `quantiles < 2`.
pub fn quantile_buckets(values: &[f64], quantiles: usize) -> Result<Buckets> {
    check_quantiles(quantiles)?;
    if values.is_empty() {
        return Ok(Buckets {
            labels: Vec::new(),
            count: 0,
        });
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut edges: Vec<f64> = (0..=quantiles)
        .map(|i| quantile_sorted(&sorted, i as f64 / quantiles as f64))
        .collect();
    edges.dedup();

    let count = edges.len().saturating_sub(1).max(1);
    if count < quantiles {
        debug!(requested = quantiles, formed = count, "merged duplicate bucket edges");
    }

    let upper = &edges[1.min(edges.len() - 1)..];
    let labels = values
        .iter()
        .map(|v| upper.partition_point(|e| e < v).min(count - 1))
        .collect();
    Ok(Buckets { labels, count })
}

pub(crate) fn check_quantiles(quantiles: usize) -> Result<()> {
    if quantiles < 2 {
        return Err(RondaError::config(format!(
            "quantiles must be at least 2, got {quantiles}"
        )));
    }
    Ok(())
}

/// Mean target value in one signal bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantileReturn {
    /// Bucket label, `Q1` for the lowest signal values
    pub label: String,
    /// Mean target over the bucket
    pub mean_return: f64,
    /// Rows in the bucket
    pub count: usize,
}

/// Result of [`quantile_rank_analysis`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantileAnalysis {
    /// Per-bucket mean target, lowest bucket first
    pub quantile_returns: Vec<QuantileReturn>,
    /// Highest bucket mean minus lowest bucket mean
    pub long_short_return: f64,
    /// Share of rising minus share of falling steps across bucket means
    pub monotonicity: f64,
}

/// Monotonicity of an ordered sequence, in `[-1, 1]`.
///
/// `(rising steps - falling steps) / total steps`; NaN with fewer than two values.
pub fn monotonicity(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let (up, down) = values.windows(2).fold((0usize, 0usize), |(up, down), w| {
        if w[1] > w[0] {
            (up + 1, down)
        } else if w[1] < w[0] {
            (up, down + 1)
        } else {
            (up, down)
        }
    });
    (up as f64 - down as f64) / (values.len() - 1) as f64
}

/// Bucket the signal and compare the target across buckets.
///
/// # Arguments
///
/// * `signal` - Factor values
/// * `target` - Returns on the same time axis
/// * `quantiles` - Requested bucket count
///
/// # Errors
///
/// - [`RondaError::InvalidConfig`] if `quantiles < 2`
/// - [`RondaError::InsufficientData`] if fewer than `quantiles * 2` rows align
///
/// # Example
///
/// ```rust,ignore
/// use ronda_eval::quantile_rank_analysis;
///
/// let analysis = quantile_rank_analysis(&signal, &forward_returns, 5)?;
/// println!("spread: {:.4}", analysis.long_short_return);
/// ```
pub fn quantile_rank_analysis(
    signal: &FactorSignal,
    target: &TimeSeries<f64>,
    quantiles: usize,
) -> Result<QuantileAnalysis> {
    check_quantiles(quantiles)?;
    let pair = align(signal, target);
    if pair.len() < quantiles * 2 {
        return Err(RondaError::insufficient(format!(
            "quantile analysis needs at least {} aligned rows, got {}",
            quantiles * 2,
            pair.len()
        )));
    }

    let signal_values = pair.signal.to_vec();
    let buckets = quantile_buckets(&signal_values, quantiles)?;

    let mut grouped: Vec<Vec<f64>> = vec![Vec::new(); buckets.count];
    for (&b, &t) in buckets.labels.iter().zip(pair.target.iter()) {
        grouped[b].push(t);
    }

    let quantile_returns: Vec<QuantileReturn> = grouped
        .iter()
        .enumerate()
        .filter(|(_, g)| !g.is_empty())
        .map(|(b, g)| QuantileReturn {
            label: Buckets::label(b),
            mean_return: mean(g),
            count: g.len(),
        })
        .collect();

    let means: Vec<f64> = quantile_returns.iter().map(|q| q.mean_return).collect();
    let long_short_return = match (means.first(), means.last()) {
        (Some(low), Some(high)) if means.len() >= 2 => high - low,
        _ => f64::NAN,
    };

    Ok(QuantileAnalysis {
        monotonicity: monotonicity(&means),
        quantile_returns,
        long_short_return,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_buckets_equal_population() {
        let values: Vec<f64> = (0..10).map(f64::from).collect();
        let buckets = quantile_buckets(&values, 5).unwrap();
        assert_eq!(buckets.count, 5);
        assert_eq!(buckets.labels, vec![0, 0, 1, 1, 2, 2, 3, 3, 4, 4]);
    }

    #[test]
    fn test_buckets_merge_duplicate_edges() {
        let values = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0];
        let buckets = quantile_buckets(&values, 5).unwrap();
        assert!(buckets.count < 5);
        assert!(buckets.labels.iter().all(|&b| b < buckets.count));
        assert_eq!(buckets.labels[0], 0);
        assert_eq!(buckets.labels[9], buckets.count - 1);
    }

    #[test]
    fn test_constant_values_form_one_bucket() {
        let buckets = quantile_buckets(&[3.0; 8], 4).unwrap();
        assert_eq!(buckets.count, 1);
        assert!(buckets.labels.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_invalid_quantiles() {
        assert!(matches!(
            quantile_buckets(&[1.0, 2.0], 1),
            Err(RondaError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_monotonic_signal_and_target() {
        let signal = TimeSeries::from_values((0..100).map(f64::from).collect());
        let target = TimeSeries::from_values((0..100).map(|i| f64::from(i) * 0.001).collect());

        let analysis = quantile_rank_analysis(&signal, &target, 5).unwrap();
        assert_eq!(analysis.quantile_returns.len(), 5);
        assert_eq!(analysis.monotonicity, 1.0);
        assert!(analysis.long_short_return > 0.0);
        assert_relative_eq!(analysis.long_short_return, 0.08, epsilon = 1e-12);
        assert!(analysis.quantile_returns.iter().all(|q| q.count == 20));
    }

    #[test]
    fn test_insufficient_rows() {
        let signal = TimeSeries::from_values(vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            quantile_rank_analysis(&signal, &signal, 5),
            Err(RondaError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_monotonicity_score() {
        assert_eq!(monotonicity(&[1.0, 2.0, 1.5, 3.0]), 1.0 / 3.0);
        assert_eq!(monotonicity(&[3.0, 2.0, 1.0]), -1.0);
        assert!(monotonicity(&[1.0]).is_nan());
    }
}
