#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ronda/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! ## Crate Organization
//!
//! - [`traits`] - Data model and capability traits ([`SignalProvider`], [`StrategyRule`])
//! - [`eval`] - IC analysis, performance metrics and backtesting
//! - [`signals`] - Signal registration
//!
//! ## Architecture
//!
//! 1. **Providers** turn a price table into a factor signal
//! 2. **Analyzers** measure how well the signal predicts returns
//! 3. **Backtests** translate the signal into simulated trades
//! 4. **Scorecards and rankings** summarize factors for selection

/// Version information for the ronda crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Core Traits
// ============================================================================

/// Core data model for ronda.
///
/// - [`TimeSeries`](traits::TimeSeries) - timestamp-indexed values
/// - [`PriceTable`](traits::PriceTable) - OHLCV bars
/// - [`SignalProvider`] - computes a factor signal from prices
/// - [`StrategyRule`] - turns a signal value into a trade
pub mod traits {
    pub use ronda_traits::*;
}

// Re-export core traits at top level for convenience
pub use ronda_traits::{SignalProvider, StrategyRule};

// Re-export error types
pub use ronda_traits::{Result, RondaError};

// Re-export common types
pub use ronda_traits::{FactorSignal, PriceTable, TimeSeries, Timestamp};

// ============================================================================
// Evaluation
// ============================================================================

/// Factor evaluation and backtesting.
///
/// ## Information Coefficient (IC)
///
/// Correlation between signal values and returns:
///
/// ```text
/// IC = corr(signal_t, return_{t+h})
/// ```
///
/// ## Information Ratio of the IC
///
/// ```text
/// IC_IR = mean(rolling IC) / std(rolling IC)
/// ```
///
/// # Example
///
/// ```ignore
/// use ronda::eval::{IcAnalyzer, IcConfig};
///
/// let analyzer = IcAnalyzer::new(IcConfig::default());
/// let stats = analyzer.ic_stats(&signal, &returns, &[1, 5, 20])?;
/// println!("IC(1): {:.3}", stats[&1].ic);
/// ```
pub mod eval {
    pub use ronda_eval::*;
}

// ============================================================================
// Signals
// ============================================================================

/// Signal registration.
///
/// # Example
///
/// ```ignore
/// use ronda::signals::SignalRegistry;
///
/// let registry = SignalRegistry::from_columns(&frame)?;
/// for name in registry.names() {
///     println!("{name}");
/// }
/// ```
pub mod signals {
    pub use ronda_signals::*;
}

// ============================================================================
// Prelude
// ============================================================================

/// Prelude module for convenient imports.
///
/// ```ignore
/// use ronda::prelude::*;
/// ```
pub mod prelude {
    pub use crate::eval::{
        BacktestConfig, BacktestEngine, DEFAULT_PERIODS, IcAnalyzer, IcConfig, IcMethod,
        PerformanceAnalyzer, PerformanceConfig, QuantileBacktestConfig,
    };
    pub use crate::signals::{FnSignal, PrecomputedSignal, SignalRegistry};
    pub use crate::traits::{
        FactorSignal, PriceBar, PriceTable, SignalProvider, StrategyRule, ThresholdStrategy,
        TimeSeries, Timestamp,
    };
    pub use crate::{Result, RondaError};
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
    }

    #[test]
    fn test_re_exports() {
        fn _accept_provider(_provider: &dyn SignalProvider) {}
        fn _accept_rule(_rule: &dyn StrategyRule) {}
    }

    #[test]
    fn test_prelude_end_to_end() {
        use crate::prelude::*;

        let prices = PriceTable::from_closes(&[100.0, 103.0, 101.0, 104.0, 102.0]);
        let signal = prices.close().pct_change();
        let report = BacktestEngine::default()
            .run_factor_backtest(&signal, &prices)
            .unwrap();
        assert_eq!(report.equity_curve.len(), 4);

        let _error: RondaError = RondaError::InvalidData("test".to_string());
    }
}
