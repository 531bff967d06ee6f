//! Environment-driven settings for the Ronda CLI.

use anyhow::{Context, Result};
use ronda_eval::{BacktestConfig, PerformanceConfig};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Settings read from the environment, overridable by flags.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) backtest: BacktestConfig,
    pub(crate) performance: PerformanceConfig,
    pub(crate) rolling_window: usize,
    pub(crate) log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backtest: BacktestConfig::default(),
            performance: PerformanceConfig::default(),
            rolling_window: 30,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub(crate) fn from_env() -> Result<Self> {
        // Try to load .env file (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let backtest = BacktestConfig {
            initial_capital: parse_var(&lookup, "BACKTEST_INITIAL_CAPITAL", defaults.backtest.initial_capital)?,
            commission_rate: parse_var(&lookup, "BACKTEST_COMMISSION", defaults.backtest.commission_rate)?,
            slippage_rate: parse_var(&lookup, "BACKTEST_SLIPPAGE", defaults.backtest.slippage_rate)?,
            max_position_size: parse_var(
                &lookup,
                "BACKTEST_MAX_POSITION_SIZE",
                defaults.backtest.max_position_size,
            )?,
            ..defaults.backtest
        };
        let performance = PerformanceConfig {
            risk_free_rate: parse_var(&lookup, "ANALYSIS_RISK_FREE_RATE", defaults.performance.risk_free_rate)?,
            periods_per_year: parse_var(
                &lookup,
                "ANALYSIS_PERIODS_PER_YEAR",
                defaults.performance.periods_per_year,
            )?,
            ..defaults.performance
        };

        let settings = Self {
            backtest,
            performance,
            rolling_window: parse_var(&lookup, "ANALYSIS_ROLLING_WINDOW", defaults.rolling_window)?,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
        };
        settings.backtest.validate()?;
        settings.performance.validate()?;
        Ok(settings)
    }
}

/// Parse `key`, falling back to `default` only when the variable is unset.
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| anyhow::anyhow!("{e}"))
            .with_context(|| format!("invalid value '{raw}' for {key}")),
        None => Ok(default),
    }
}
