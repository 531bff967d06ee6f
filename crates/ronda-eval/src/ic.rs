//! Information Coefficient (IC) calculations.
//!
//! IC is the correlation between a signal value and the return realized
//! after it was observed. Values range from -1 to 1, where:
//! - Positive values indicate the signal predicts returns in the correct direction
//! - Negative values indicate inverse correlation
//! - Values near zero indicate no predictive power

use crate::align::{AlignedPair, align};
use ndarray::{Array1, ArrayView1, Zip};
use ronda_traits::stats::{is_degenerate, mean, sample_std};
use ronda_traits::{FactorSignal, Result, RondaError, TimeSeries};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Correlation coefficient used to compute IC.
///
/// Pearson uses magnitudes. Spearman and Kendall only use ordering, so they
/// are robust to outliers but blind to the size of a move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IcMethod {
    /// Linear (product-moment) correlation.
    #[default]
    Pearson,
    /// Rank correlation with average ranks for ties.
    Spearman,
    /// Kendall's tau-b, adjusted for ties.
    Kendall,
}

impl FromStr for IcMethod {
    type Err = RondaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pearson" => Ok(Self::Pearson),
            "spearman" => Ok(Self::Spearman),
            "kendall" => Ok(Self::Kendall),
            other => Err(RondaError::config(format!(
                "unsupported correlation method '{other}' (expected pearson, spearman or kendall)"
            ))),
        }
    }
}

impl fmt::Display for IcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pearson => "pearson",
            Self::Spearman => "spearman",
            Self::Kendall => "kendall",
        };
        f.write_str(name)
    }
}

/// Pearson correlation. NaN when either side has zero variance.
pub fn pearson(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> f64 {
    let n = x.len();
    if n < 2 || n != y.len() {
        return f64::NAN;
    }
    let mx = x.sum() / n as f64;
    let my = y.sum() / n as f64;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    Zip::from(&x).and(&y).for_each(|&a, &b| {
        let (dx, dy) = (a - mx, b - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    });

    let dof = (n - 1) as f64;
    if is_degenerate((sxx / dof).sqrt()) || is_degenerate((syy / dof).sqrt()) {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// 1-based ranks, tied values sharing the mean of the ranks they span.
fn average_ranks(values: ArrayView1<'_, f64>) -> Array1<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = Array1::zeros(values.len());
    let mut below = 0;
    for run in order.chunk_by(|&a, &b| values[a] == values[b]) {
        let rank = below as f64 + (run.len() + 1) as f64 / 2.0;
        for &i in run {
            ranks[i] = rank;
        }
        below += run.len();
    }
    ranks
}

/// Spearman rank correlation: Pearson over average ranks.
pub fn spearman(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> f64 {
    if x.len() != y.len() {
        return f64::NAN;
    }
    pearson(average_ranks(x).view(), average_ranks(y).view())
}

/// Kendall's tau-b.
///
/// Counts concordant and discordant pairs, correcting the denominator for
/// pairs tied in either series. NaN if every pair is tied on one side.
pub fn kendall_tau_b(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> f64 {
    let n = x.len();
    if n < 2 || n != y.len() {
        return f64::NAN;
    }

    let (mut concordant, mut discordant) = (0i64, 0i64);
    let (mut ties_x, mut ties_y) = (0i64, 0i64);
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = (x[i] - x[j]).partial_cmp(&0.0);
            let dy = (y[i] - y[j]).partial_cmp(&0.0);
            match (dx, dy) {
                (Some(std::cmp::Ordering::Equal), Some(std::cmp::Ordering::Equal)) => {
                    ties_x += 1;
                    ties_y += 1;
                }
                (Some(std::cmp::Ordering::Equal), _) => ties_x += 1,
                (_, Some(std::cmp::Ordering::Equal)) => ties_y += 1,
                (a, b) if a == b => concordant += 1,
                _ => discordant += 1,
            }
        }
    }

    let total = (n * (n - 1) / 2) as i64;
    let denom = (((total - ties_x) * (total - ties_y)) as f64).sqrt();
    if denom == 0.0 {
        return f64::NAN;
    }
    (concordant - discordant) as f64 / denom
}

/// Raw correlation coefficient for `method`. May be NaN.
pub fn correlation(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>, method: IcMethod) -> f64 {
    match method {
        IcMethod::Pearson => pearson(x, y),
        IcMethod::Spearman => spearman(x, y),
        IcMethod::Kendall => kendall_tau_b(x, y),
    }
}

/// IC over already-aligned values.
///
/// NaN with fewer than two points. A coefficient that cannot be computed,
/// such as one over a constant series, is reported as 0.0; downstream
/// scoring treats "no measurable relation" as zero IC.
pub fn ic_of(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>, method: IcMethod) -> f64 {
    if x.len() < 2 {
        return f64::NAN;
    }
    let ic = correlation(x, y, method);
    if ic.is_nan() { 0.0 } else { ic }
}

/// Calculate the Information Coefficient between a signal and a target.
///
/// # Arguments
///
/// * `signal` - Factor values
/// * `target` - Returns (or forward returns) on the same time axis
/// * `method` - Correlation coefficient to use
///
/// # Returns
///
/// The coefficient over the timestamp-aligned rows, NaN if fewer than two
/// rows align.
///
/// # Example
///
/// ```rust,ignore
/// use ronda_eval::{IcMethod, ic};
///
/// let forward = prices.close().pct_change().shift(-1);
/// let value = ic(&signal, &forward, IcMethod::Spearman);
/// ```
pub fn ic(signal: &FactorSignal, target: &TimeSeries<f64>, method: IcMethod) -> f64 {
    let pair = align(signal, target);
    ic_of(pair.signal.view(), pair.target.view(), method)
}

fn check_window(window: usize) -> Result<()> {
    if window < 2 {
        return Err(RondaError::config(format!(
            "rolling window must be at least 2, got {window}"
        )));
    }
    Ok(())
}

/// Rolling IC over an aligned pair.
///
/// Entry `i` covers rows `i + 1 - window ..= i`. Rows before the first full
/// window are absent, so the result has at most `len - window + 1` points.
pub fn rolling_ic_aligned(pair: &AlignedPair, window: usize, method: IcMethod) -> TimeSeries<f64> {
    if window == 0 || pair.len() < window {
        return TimeSeries::empty();
    }
    let (index, values): (Vec<_>, Vec<_>) = (window - 1..pair.len())
        .map(|end| {
            let (x, y) = pair.window(end + 1 - window, end + 1);
            (pair.index[end], ic_of(x, y, method))
        })
        .unzip();
    // Aligned indexes are strictly increasing, so this cannot fail.
    TimeSeries::new(index, values).unwrap_or_default()
}

/// Calculate rolling IC between a signal and a target.
///
/// # Errors
///
/// Returns [`RondaError::InvalidConfig`] if `window < 2`.
pub fn rolling_ic(
    signal: &FactorSignal,
    target: &TimeSeries<f64>,
    window: usize,
    method: IcMethod,
) -> Result<TimeSeries<f64>> {
    check_window(window)?;
    Ok(rolling_ic_aligned(&align(signal, target), window, method))
}

/// IC stability ratio of a rolling IC sequence: mean / sample std.
///
/// NaN with fewer than two values or a zero standard deviation.
pub fn ic_ir_of(rolling: &[f64]) -> f64 {
    if rolling.len() < 2 {
        return f64::NAN;
    }
    let std = sample_std(rolling);
    if is_degenerate(std) {
        return f64::NAN;
    }
    mean(rolling) / std
}

/// Calculate IC_IR: the mean of rolling IC divided by its standard deviation.
///
/// # Errors
///
/// Returns [`RondaError::InvalidConfig`] if `window < 2`.
pub fn ic_ir(
    signal: &FactorSignal,
    target: &TimeSeries<f64>,
    window: usize,
    method: IcMethod,
) -> Result<f64> {
    let rolling = rolling_ic(signal, target, window, method)?;
    Ok(ic_ir_of(rolling.values()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn series(values: &[f64]) -> TimeSeries<f64> {
        TimeSeries::from_values(values.to_vec())
    }

    #[test]
    fn test_perfect_linear_correlation() {
        let signal = series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let target = series(&[0.02, 0.04, 0.06, 0.08, 0.10]);
        for method in [IcMethod::Pearson, IcMethod::Spearman, IcMethod::Kendall] {
            assert_relative_eq!(ic(&signal, &target, method), 1.0, epsilon = 1e-10);
        }

        let inverse = series(&[0.10, 0.08, 0.06, 0.04, 0.02]);
        assert_relative_eq!(ic(&signal, &inverse, IcMethod::Pearson), -1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_ic_fewer_than_two_points_is_nan() {
        let signal = series(&[1.0, f64::NAN]);
        let target = series(&[0.1, 0.2]);
        assert!(ic(&signal, &target, IcMethod::Pearson).is_nan());
    }

    #[test]
    fn test_undefined_coefficient_normalized_to_zero() {
        let signal = series(&[1.0, 2.0, 3.0, 4.0]);
        let flat = series(&[0.01, 0.01, 0.01, 0.01]);
        assert_eq!(ic(&signal, &flat, IcMethod::Pearson), 0.0);
        assert_eq!(ic(&signal, &flat, IcMethod::Kendall), 0.0);
        assert!(pearson(array![1.0, 2.0].view(), array![3.0, 3.0].view()).is_nan());
    }

    #[test]
    fn test_ic_invariant_to_joint_permutation_only() {
        let signal = [0.3, -0.1, 0.8, 0.2, -0.5, 0.6];
        let target = [0.01, 0.02, 0.03, -0.01, -0.02, 0.02];
        let base = ic(&series(&signal), &series(&target), IcMethod::Pearson);

        let perm = [3, 0, 5, 1, 4, 2];
        let ps: Vec<f64> = perm.iter().map(|&i| signal[i]).collect();
        let pt: Vec<f64> = perm.iter().map(|&i| target[i]).collect();
        let permuted = ic(&series(&ps), &series(&pt), IcMethod::Pearson);
        assert_relative_eq!(base, permuted, epsilon = 1e-12);

        let shuffled_one = ic(&series(&ps), &series(&target), IcMethod::Pearson);
        assert!((base - shuffled_one).abs() > 1e-6);
    }

    #[test]
    fn test_spearman_handles_ties() {
        let x = array![1.0, 2.0, 2.0, 3.0];
        let y = array![1.0, 2.0, 3.0, 4.0];
        let rho = spearman(x.view(), y.view());
        // Ranks of x are [1, 2.5, 2.5, 4].
        assert_relative_eq!(rho, 0.948_683_298_050_513_8, epsilon = 1e-12);
    }

    #[test]
    fn test_average_ranks_are_one_based() {
        let ranks = average_ranks(array![3.0, 1.0, 4.0, 1.0, 5.0, 4.0].view());
        assert_eq!(ranks, array![3.0, 1.5, 4.5, 1.5, 6.0, 4.5]);
        assert!(average_ranks(Array1::<f64>::zeros(0).view()).is_empty());
    }

    #[test]
    fn test_kendall_tau_b_with_ties() {
        let x = array![1.0, 2.0, 2.0, 3.0];
        let y = array![1.0, 2.0, 3.0, 4.0];
        // 5 concordant, 0 discordant, one tie in x: 5 / sqrt(5 * 6).
        assert_relative_eq!(kendall_tau_b(x.view(), y.view()), 5.0 / 30f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("Spearman".parse::<IcMethod>().unwrap(), IcMethod::Spearman);
        assert_eq!(IcMethod::default(), IcMethod::Pearson);
        assert!(matches!(
            "cosine".parse::<IcMethod>(),
            Err(RondaError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rolling_ic_length_and_index() {
        let n = 12;
        let signal = series(&(0..n).map(|i| (i as f64 * 0.7).sin()).collect::<Vec<_>>());
        let target = series(&(0..n).map(|i| (i as f64 * 0.3).cos()).collect::<Vec<_>>());

        let rolling = rolling_ic(&signal, &target, 5, IcMethod::Pearson).unwrap();
        assert_eq!(rolling.len(), n - 5 + 1);
        assert_eq!(rolling.index()[0], ronda_traits::Timestamp::Ordinal(4));
        assert!(rolling.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_rolling_ic_short_input_is_empty() {
        let signal = series(&[1.0, 2.0, 3.0]);
        let rolling = rolling_ic(&signal, &signal, 5, IcMethod::Pearson).unwrap();
        assert!(rolling.is_empty());
        assert!(rolling_ic(&signal, &signal, 1, IcMethod::Pearson).is_err());
    }

    #[test]
    fn test_ic_ir() {
        assert!(ic_ir_of(&[0.1]).is_nan());
        assert!(ic_ir_of(&[0.1, 0.1, 0.1]).is_nan());
        assert_relative_eq!(ic_ir_of(&[0.1, 0.3]), 0.2 / 0.02f64.sqrt(), epsilon = 1e-12);
    }
}
