//! Statistical utility functions shared by the analyzers.
//!
//! All functions take plain slices and return NaN where a statistic is
//! undefined, so callers can propagate "undefined" without branching.

/// Minimum threshold for standard deviation to avoid division by zero.
/// Values below this threshold are treated as zero variance.
pub const MIN_STD_THRESHOLD: f64 = 1e-10;

/// Arithmetic mean. NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (N-1 denominator). NaN with fewer than two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// Population variance (N denominator). NaN for an empty slice.
pub fn population_variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (N-1 denominator).
pub fn sample_std(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

/// Sample covariance (N-1 denominator) of two equal-length slices.
pub fn sample_covariance(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n < 2 || n != y.len() {
        return f64::NAN;
    }
    let (mx, my) = (mean(x), mean(y));
    x.iter()
        .zip(y)
        .map(|(a, b)| (a - mx) * (b - my))
        .sum::<f64>()
        / (n - 1) as f64
}

/// Whether a standard deviation is too small to divide by.
pub fn is_degenerate(std: f64) -> bool {
    !std.is_finite() || std < MIN_STD_THRESHOLD
}

/// Quantile with linear interpolation between order statistics.
///
/// `q` is clamped to `[0, 1]`. NaN for an empty slice.
///
/// # Examples
///
/// ```
/// use ronda_traits::stats::quantile;
///
/// let values = [1.0, 2.0, 3.0, 4.0, 5.0];
/// assert!((quantile(&values, 0.5) - 3.0).abs() < 1e-12);
/// assert!((quantile(&values, 0.05) - 1.2).abs() < 1e-12);
/// ```
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, q)
}

/// [`quantile`] over values already sorted ascending.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Sums of squared, cubed and fourth-power deviations from the mean.
fn central_sums(values: &[f64]) -> (f64, f64, f64) {
    let m = mean(values);
    values.iter().fold((0.0, 0.0, 0.0), |(s2, s3, s4), x| {
        let d = x - m;
        let d2 = d * d;
        (s2 + d2, s3 + d2 * d, s4 + d2 * d2)
    })
}

/// Bias-corrected sample skewness (G1).
///
/// NaN with fewer than three values, 0 when the values are constant.
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return f64::NAN;
    }
    let nf = n as f64;
    let (s2, s3, _) = central_sums(values);
    let m2 = s2 / nf;
    let m3 = s3 / nf;
    if m2 < MIN_STD_THRESHOLD * MIN_STD_THRESHOLD {
        return 0.0;
    }
    (nf * (nf - 1.0)).sqrt() / (nf - 2.0) * (m3 / m2.powf(1.5))
}

/// Bias-corrected sample excess kurtosis (G2).
///
/// NaN with fewer than four values, 0 when the values are constant.
pub fn kurtosis(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 4 {
        return f64::NAN;
    }
    let nf = n as f64;
    let (s2, _, s4) = central_sums(values);
    if s2 / nf < MIN_STD_THRESHOLD * MIN_STD_THRESHOLD {
        return 0.0;
    }
    let adj = 3.0 * (nf - 1.0).powi(2) / ((nf - 2.0) * (nf - 3.0));
    let numerator = nf * (nf + 1.0) * (nf - 1.0) * s4;
    let denominator = (nf - 2.0) * (nf - 3.0) * s2 * s2;
    numerator / denominator - adj
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_and_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&values), 5.0);
        assert_relative_eq!(sample_std(&values), (32.0_f64 / 7.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(population_variance(&values), 4.0, epsilon = 1e-12);
        assert!(population_variance(&[]).is_nan());
    }

    #[test]
    fn test_undefined_statistics() {
        assert!(mean(&[]).is_nan());
        assert!(sample_std(&[1.0]).is_nan());
        assert!(skewness(&[1.0, 2.0]).is_nan());
        assert!(kurtosis(&[1.0, 2.0, 3.0]).is_nan());
        assert!(quantile(&[], 0.5).is_nan());
    }

    #[test]
    fn test_quantile_interpolates() {
        let values = [5.0, 1.0, 4.0, 2.0, 3.0];
        assert_relative_eq!(quantile(&values, 0.0), 1.0);
        assert_relative_eq!(quantile(&values, 1.0), 5.0);
        assert_relative_eq!(quantile(&values, 0.25), 2.0);
        assert_relative_eq!(quantile(&values, 0.1), 1.4, epsilon = 1e-12);
    }

    #[test]
    fn test_skewness_matches_bias_corrected_formula() {
        // Reference value from the adjusted Fisher-Pearson coefficient.
        let values = [1.0, 2.0, 3.0, 10.0];
        assert_relative_eq!(skewness(&values), 1.763_632_614_803_888, epsilon = 1e-9);
        assert_relative_eq!(skewness(&[1.0, 2.0, 3.0]), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_kurtosis_matches_bias_corrected_formula() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(kurtosis(&values), -1.2, epsilon = 1e-12);
        assert_eq!(kurtosis(&[3.0; 6]), 0.0);
    }

    #[test]
    fn test_covariance() {
        let x = [1.0, 2.0, 3.0];
        let y = [2.0, 4.0, 6.0];
        assert_relative_eq!(sample_covariance(&x, &y), 2.0);
        assert!(sample_covariance(&x, &y[..2]).is_nan());
    }
}
