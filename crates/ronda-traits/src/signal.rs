//! Signal provider capability.
//!
//! The engine never knows how a factor is computed. It only asks a
//! [`SignalProvider`] to turn a [`PriceTable`] into a [`FactorSignal`].

use crate::{FactorSignal, PriceTable, Result};
use std::collections::BTreeMap;

/// Named numeric parameters passed to a provider.
pub type SignalParams = BTreeMap<String, f64>;

/// Computes a factor signal from a price table.
///
/// Implementations should be thread-safe (`Send + Sync`) so independent
/// factors can be evaluated in parallel against a shared, read-only table.
///
/// A provider that cannot produce values for some timestamps should return
/// NaN there. An all-NaN signal is treated as insufficient data downstream,
/// not as a crash.
///
/// # Example
///
/// ```
/// use ronda_traits::{FactorSignal, PriceTable, Result, SignalProvider};
///
/// struct LastReturn;
///
/// impl SignalProvider for LastReturn {
///     fn name(&self) -> &str {
///         "last_return"
///     }
///
///     fn compute(&self, prices: &PriceTable) -> Result<FactorSignal> {
///         Ok(prices.close().pct_change())
///     }
/// }
///
/// let prices = PriceTable::from_closes(&[100.0, 101.0, 99.0]);
/// let signal = LastReturn.compute(&prices).unwrap();
/// assert_eq!(signal.len(), 3);
/// ```
pub trait SignalProvider: Send + Sync {
    /// Unique name used for registration, logging and ranking output.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str {
        ""
    }

    /// Computes the signal with default parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the price table lacks what the provider needs.
    fn compute(&self, prices: &PriceTable) -> Result<FactorSignal>;

    /// Computes the signal with explicit parameters.
    ///
    /// Providers without parameters ignore `params`.
    fn compute_with(&self, prices: &PriceTable, params: &SignalParams) -> Result<FactorSignal> {
        let _ = params;
        self.compute(prices)
    }
}
