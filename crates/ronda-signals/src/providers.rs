//! Generic signal providers.

use polars::prelude::DataFrame;
use ronda_traits::{FactorSignal, PriceTable, Result, SignalParams, SignalProvider, signal_from_column};
use std::fmt;

/// A factor computed ahead of time and supplied with the data.
///
/// The stored series is returned as-is. Rows that do not line up with the
/// price table are dropped by alignment downstream.
#[derive(Debug, Clone)]
pub struct PrecomputedSignal {
    name: String,
    description: String,
    signal: FactorSignal,
}

impl PrecomputedSignal {
    /// Wrap an existing series.
    pub fn new(name: impl Into<String>, signal: FactorSignal) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            signal,
        }
    }

    /// Read the factor from column `column` of `df`.
    ///
    /// The frame must carry the same timestamp column the price table was
    /// built from, so both index the same rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is missing or not numeric.
    pub fn from_column(df: &DataFrame, column: &str) -> Result<Self> {
        let signal = signal_from_column(df, column)?;
        Ok(Self::new(column, signal).with_description(format!("column '{column}'")))
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The stored series.
    pub const fn signal(&self) -> &FactorSignal {
        &self.signal
    }
}

impl SignalProvider for PrecomputedSignal {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn compute(&self, _prices: &PriceTable) -> Result<FactorSignal> {
        Ok(self.signal.clone())
    }
}

/// A provider backed by a function of the price table and parameters.
///
/// Default parameters are merged under any explicit ones passed to
/// [`SignalProvider::compute_with`].
pub struct FnSignal<F> {
    name: String,
    description: String,
    defaults: SignalParams,
    func: F,
}

impl<F> FnSignal<F>
where
    F: Fn(&PriceTable, &SignalParams) -> Result<FactorSignal> + Send + Sync,
{
    /// Create a provider named `name` computing `func`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use ronda_signals::FnSignal;
    ///
    /// let reversal = FnSignal::new("reversal", |prices, _params| {
    ///     Ok(prices.close().pct_change().map(|r| -r))
    /// });
    /// ```
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            defaults: SignalParams::new(),
            func,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set a default parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: f64) -> Self {
        self.defaults.insert(key.into(), value);
        self
    }

    /// Default parameters.
    pub const fn defaults(&self) -> &SignalParams {
        &self.defaults
    }
}

impl<F> fmt::Debug for FnSignal<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSignal")
            .field("name", &self.name)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl<F> SignalProvider for FnSignal<F>
where
    F: Fn(&PriceTable, &SignalParams) -> Result<FactorSignal> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn compute(&self, prices: &PriceTable) -> Result<FactorSignal> {
        (self.func)(prices, &self.defaults)
    }

    fn compute_with(&self, prices: &PriceTable, params: &SignalParams) -> Result<FactorSignal> {
        let mut merged = self.defaults.clone();
        merged.extend(params.iter().map(|(k, v)| (k.clone(), *v)));
        (self.func)(prices, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use polars::df;
    use ronda_traits::TimeSeries;

    fn scaled() -> impl SignalProvider {
        FnSignal::new("scaled", |prices: &PriceTable, params: &SignalParams| {
            let k = params.get("k").copied().unwrap_or(1.0);
            Ok(prices.close().map(|c| c * k))
        })
        .with_param("k", 2.0)
        .with_description("close times k")
    }

    #[test]
    fn test_fn_signal_defaults() {
        let prices = PriceTable::from_closes(&[10.0, 20.0]);
        let provider = scaled();

        assert_eq!(provider.name(), "scaled");
        assert_eq!(provider.description(), "close times k");
        assert_eq!(provider.compute(&prices).unwrap().values(), &[20.0, 40.0]);
    }

    #[test]
    fn test_fn_signal_params_override_defaults() {
        let prices = PriceTable::from_closes(&[10.0, 20.0]);
        let params = SignalParams::from([("k".to_string(), 0.5)]);
        let signal = scaled().compute_with(&prices, &params).unwrap();
        assert_relative_eq!(signal.values()[1], 10.0);
    }

    #[test]
    fn test_precomputed_returns_stored_series() {
        let stored = TimeSeries::from_values(vec![0.1, f64::NAN, 0.3]);
        let provider = PrecomputedSignal::new("stored", stored.clone());
        let prices = PriceTable::from_closes(&[1.0]);

        let signal = provider.compute(&prices).unwrap();
        assert_eq!(signal.index(), stored.index());
        assert!(signal.values()[1].is_nan());
    }

    #[test]
    fn test_precomputed_from_column() {
        let df = df! {
            "date" => ["2024-01-02", "2024-01-03"],
            "close" => [100.0, 101.0],
            "mom" => [Some(0.5), None],
        }
        .unwrap();

        let provider = PrecomputedSignal::from_column(&df, "mom").unwrap();
        assert_eq!(provider.name(), "mom");
        assert_eq!(provider.signal().len(), 2);
        assert!(provider.signal().values()[1].is_nan());
        assert!(PrecomputedSignal::from_column(&df, "missing").is_err());
    }
}
