//! Signal decay analysis.
//!
//! Measures how the IC of a signal fades as the forecast horizon grows.
//! Useful for choosing a holding period and rebalancing frequency.

use crate::ic::{IcMethod, ic};
use ronda_traits::{FactorSignal, Result, RondaError, TimeSeries, Timestamp};
use serde::{Deserialize, Serialize};

/// IC by forecast horizon.
///
/// Entry `h` is the plain IC between the signal and the target shifted
/// back by `h` steps, for `h` in `1..=max_period`.
///
/// # Errors
///
/// Returns [`RondaError::InvalidConfig`] if `max_period` is 0.
///
/// # Example
///
/// ```rust,ignore
/// use ronda_eval::{IcMethod, ic_decay};
///
/// let decay = ic_decay(&signal, &returns, 20, IcMethod::Pearson)?;
/// ```
pub fn ic_decay(
    signal: &FactorSignal,
    target: &TimeSeries<f64>,
    max_period: usize,
    method: IcMethod,
) -> Result<TimeSeries<f64>> {
    if max_period == 0 {
        return Err(RondaError::config("max_period must be at least 1"));
    }
    let (index, values): (Vec<_>, Vec<_>) = (1..=max_period)
        .map(|h| {
            let forward = target.shift(-(h as isize));
            (Timestamp::Ordinal(h as i64), ic(signal, &forward, method))
        })
        .unzip();
    TimeSeries::new(index, values)
}

/// Decay curve data points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecayCurve {
    /// Forecast horizons, in steps
    pub horizons: Vec<usize>,
    /// IC values at each horizon
    pub ic_values: Vec<f64>,
}

impl DecayCurve {
    /// Create a new decay curve.
    pub const fn new(horizons: Vec<usize>, ic_values: Vec<f64>) -> Self {
        Self {
            horizons,
            ic_values,
        }
    }

    /// Builds a curve from an [`ic_decay`] series.
    pub fn from_series(series: &TimeSeries<f64>) -> Self {
        let horizons = series
            .index()
            .iter()
            .map(|t| match t {
                Timestamp::Ordinal(h) => *h as usize,
                Timestamp::Time(_) => 0,
            })
            .collect();
        Self::new(horizons, series.values().to_vec())
    }

    /// Get IC at a specific horizon (interpolated if needed).
    pub fn ic_at_horizon(&self, horizon: usize) -> Option<f64> {
        // Find exact match
        if let Some(pos) = self.horizons.iter().position(|&h| h == horizon) {
            return Some(self.ic_values[pos]);
        }

        // Linear interpolation
        self.horizons.windows(2).enumerate().find_map(|(i, w)| {
            if w[0] < horizon && horizon < w[1] {
                let weight = (horizon - w[0]) as f64 / (w[1] - w[0]) as f64;
                Some(self.ic_values[i] + weight * (self.ic_values[i + 1] - self.ic_values[i]))
            } else {
                None
            }
        })
    }

    /// Estimate half-life: horizon at which |IC| first drops to half of its
    /// value at the shortest horizon.
    pub fn half_life(&self) -> Option<f64> {
        let initial_ic = self.ic_values.first()?.abs();
        if !initial_ic.is_finite() || initial_ic == 0.0 {
            return None;
        }
        let half_ic = initial_ic / 2.0;

        // Find where IC crosses half value
        for i in 0..self.ic_values.len().saturating_sub(1) {
            let ic1 = self.ic_values[i].abs();
            let ic2 = self.ic_values[i + 1].abs();

            if ic1 >= half_ic && ic2 <= half_ic {
                // Interpolate
                let h1 = self.horizons[i] as f64;
                let h2 = self.horizons[i + 1] as f64;
                let weight = (ic1 - half_ic) / (ic1 - ic2);
                return Some(h1 + weight * (h2 - h1));
            }
        }

        None
    }

    /// Horizon with the largest |IC|, ignoring NaN.
    pub fn peak(&self) -> Option<(usize, f64)> {
        self.ic_values
            .iter()
            .enumerate()
            .filter(|(_, ic)| ic.is_finite())
            .max_by(|(_, a), (_, b)| a.abs().total_cmp(&b.abs()))
            .map(|(idx, &ic)| (self.horizons[idx], ic))
    }
}

/// Summary of an [`ic_decay`] run.
#[derive(Debug, Clone, Serialize)]
pub struct DecayAnalysis {
    /// IC by horizon
    pub curve: TimeSeries<f64>,
    /// Estimated half-life in steps
    pub half_life: Option<f64>,
    /// Horizon and value of the largest |IC|
    pub peak: Option<(usize, f64)>,
}

impl DecayAnalysis {
    /// Summarizes an IC-by-horizon series.
    pub fn from_series(curve: TimeSeries<f64>) -> Self {
        let points = DecayCurve::from_series(&curve);
        Self {
            half_life: points.half_life(),
            peak: points.peak(),
            curve,
        }
    }
}
