//! Signal registry for discovering and computing registered signals.
//!
//! The registry is the only place the engine looks factors up by name.
//! Each entry pairs a [`SignalProvider`] with [`SignalInfo`] metadata.

use crate::providers::PrecomputedSignal;
use polars::prelude::DataFrame;
use ronda_traits::{
    FactorSignal, PriceTable, Result, RondaError, SignalParams, SignalProvider, factor_columns,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Signal category classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignalCategory {
    /// Price momentum signals
    Momentum,
    /// Mean reversion signals
    Reversion,
    /// Volatility and range signals
    Volatility,
    /// Volume and liquidity signals
    Volume,
    /// Technical indicators
    Technical,
    /// Factors supplied with the data
    Precomputed,
    /// Anything else
    Custom,
}

impl SignalCategory {
    /// Get a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &str {
        match self {
            Self::Momentum => "Price momentum and trend-following signals",
            Self::Reversion => "Mean reversion and contrarian signals",
            Self::Volatility => "Volatility and price range signals",
            Self::Volume => "Volume and liquidity signals",
            Self::Technical => "Technical analysis indicators",
            Self::Precomputed => "Factor values supplied alongside the price data",
            Self::Custom => "User-defined signals",
        }
    }
}

/// Metadata about a signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalInfo {
    /// Unique identifier for the signal
    pub name: String,

    /// Category classification
    pub category: SignalCategory,

    /// Human-readable description
    pub description: String,

    /// Typical lookback period in rows
    pub typical_lookback: usize,
}

impl SignalInfo {
    /// Metadata with an empty description and no lookback.
    pub fn new(name: impl Into<String>, category: SignalCategory) -> Self {
        Self {
            name: name.into(),
            category,
            description: String::new(),
            typical_lookback: 0,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the typical lookback.
    #[must_use]
    pub const fn with_lookback(mut self, lookback: usize) -> Self {
        self.typical_lookback = lookback;
        self
    }
}

struct Entry {
    info: SignalInfo,
    provider: Box<dyn SignalProvider>,
}

/// Name to provider lookup table.
///
/// Iteration is in name order.
#[derive(Default)]
pub struct SignalRegistry {
    entries: BTreeMap<String, Entry>,
}

impl fmt::Debug for SignalRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalRegistry")
            .field("signals", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SignalRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every numeric factor column of `df` as a [`PrecomputedSignal`].
    ///
    /// Price and timestamp columns are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a factor column cannot be read.
    pub fn from_columns(df: &DataFrame) -> Result<Self> {
        let mut registry = Self::new();
        for column in factor_columns(df) {
            let provider = PrecomputedSignal::from_column(df, &column)?;
            let info = SignalInfo::new(&column, SignalCategory::Precomputed)
                .with_description(provider.description());
            registry.register(info, provider)?;
        }
        Ok(registry)
    }

    /// Register `provider` under `info.name`.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InvalidConfig`] if the name is empty, already
    /// taken, or differs from the provider's own name.
    pub fn register<P>(&mut self, info: SignalInfo, provider: P) -> Result<()>
    where
        P: SignalProvider + 'static,
    {
        if info.name.is_empty() {
            return Err(RondaError::config("signal name must not be empty"));
        }
        if info.name != provider.name() {
            return Err(RondaError::config(format!(
                "signal info '{}' does not match provider '{}'",
                info.name,
                provider.name()
            )));
        }
        if self.entries.contains_key(&info.name) {
            return Err(RondaError::config(format!(
                "signal '{}' is already registered",
                info.name
            )));
        }
        self.entries.insert(
            info.name.clone(),
            Entry {
                info,
                provider: Box::new(provider),
            },
        );
        Ok(())
    }

    /// Look up a provider by name.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::SignalNotFound`] for an unknown name.
    pub fn get(&self, name: &str) -> Result<&dyn SignalProvider> {
        self.entries
            .get(name)
            .map(|e| e.provider.as_ref())
            .ok_or_else(|| RondaError::SignalNotFound(name.to_string()))
    }

    /// Metadata of a registered signal.
    #[must_use]
    pub fn info(&self, name: &str) -> Option<&SignalInfo> {
        self.entries.get(name).map(|e| &e.info)
    }

    /// Compute a registered signal with explicit parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::SignalNotFound`] for an unknown name, or the
    /// provider's own error.
    pub fn compute(&self, name: &str, prices: &PriceTable, params: &SignalParams) -> Result<FactorSignal> {
        self.get(name)?.compute_with(prices, params)
    }

    /// Registered providers in name order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn SignalProvider> {
        self.entries.values().map(|e| e.provider.as_ref())
    }

    /// Registered names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Metadata of all signals in `category`.
    #[must_use]
    pub fn by_category(&self, category: SignalCategory) -> Vec<&SignalInfo> {
        self.entries
            .values()
            .map(|e| &e.info)
            .filter(|info| info.category == category)
            .collect()
    }

    /// Distinct categories with at least one signal.
    #[must_use]
    pub fn categories(&self) -> Vec<SignalCategory> {
        let mut categories: Vec<_> = self.entries.values().map(|e| e.info.category).collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Number of registered signals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::FnSignal;
    use polars::df;

    fn reversal() -> impl SignalProvider {
        FnSignal::new("reversal", |prices: &PriceTable, _: &SignalParams| {
            Ok(prices.close().pct_change().map(|r| -r))
        })
    }

    fn registry() -> SignalRegistry {
        let mut registry = SignalRegistry::new();
        registry
            .register(SignalInfo::new("reversal", SignalCategory::Reversion).with_lookback(1), reversal())
            .unwrap();
        registry
            .register(
                SignalInfo::new("level", SignalCategory::Custom),
                FnSignal::new("level", |prices: &PriceTable, _: &SignalParams| Ok(prices.close())),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_register_and_get() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
        assert_eq!(registry.get("reversal").unwrap().name(), "reversal");
        assert_eq!(registry.info("reversal").unwrap().typical_lookback, 1);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["level", "reversal"]);
    }

    #[test]
    fn test_missing_signal() {
        let registry = registry();
        assert!(matches!(registry.get("nope"), Err(RondaError::SignalNotFound(name)) if name == "nope"));
        let prices = PriceTable::from_closes(&[1.0, 2.0]);
        assert!(registry.compute("nope", &prices, &SignalParams::new()).is_err());
    }

    #[test]
    fn test_duplicate_and_mismatched_names() {
        let mut registry = registry();
        let duplicate = registry.register(SignalInfo::new("reversal", SignalCategory::Reversion), reversal());
        assert!(matches!(duplicate, Err(RondaError::InvalidConfig(_))));

        let mismatched = registry.register(SignalInfo::new("other", SignalCategory::Reversion), reversal());
        assert!(matches!(mismatched, Err(RondaError::InvalidConfig(_))));
    }

    #[test]
    fn test_compute_by_name() {
        let registry = registry();
        let prices = PriceTable::from_closes(&[100.0, 110.0]);
        let signal = registry.compute("reversal", &prices, &SignalParams::new()).unwrap();
        assert!(signal.values()[0].is_nan());
        assert!((signal.values()[1] + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_categories() {
        let registry = registry();
        assert_eq!(registry.categories(), vec![SignalCategory::Reversion, SignalCategory::Custom]);
        assert_eq!(registry.by_category(SignalCategory::Reversion).len(), 1);
        assert!(registry.by_category(SignalCategory::Momentum).is_empty());
        assert!(!SignalCategory::Precomputed.description().is_empty());
    }

    #[test]
    fn test_from_columns() {
        let df = df! {
            "Date" => ["2024-01-02", "2024-01-03", "2024-01-04"],
            "Close" => [100.0, 101.0, 102.0],
            "volume" => [1_000.0, 1_100.0, 900.0],
            "momentum" => [0.1, 0.2, 0.3],
            "value" => [1.0, 0.5, 0.25],
        }
        .unwrap();

        let registry = SignalRegistry::from_columns(&df).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["momentum", "value"]);
        assert_eq!(registry.categories(), vec![SignalCategory::Precomputed]);
        assert_eq!(registry.iter().count(), 2);
    }
}
