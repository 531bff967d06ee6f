//! Factor ranking.
//!
//! Scores a batch of signal providers against one price table. Each factor
//! is evaluated independently: a failure is logged and the factor skipped,
//! so one bad provider never aborts the batch.

use crate::backtest::{BacktestConfig, BacktestEngine};
use crate::ic::{IcMethod, ic};
use ronda_traits::{PriceTable, Result, RondaError, SignalProvider};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Metric used to rank factors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingMetric {
    /// Pearson IC against the one-step-forward close return
    #[default]
    Ic,
    /// Sharpe ratio of a signal-driven backtest
    Sharpe,
    /// Calmar ratio of a signal-driven backtest
    Calmar,
}

impl FromStr for RankingMetric {
    type Err = RondaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ic" => Ok(Self::Ic),
            "sharpe" => Ok(Self::Sharpe),
            "calmar" => Ok(Self::Calmar),
            other => Err(RondaError::config(format!(
                "unknown ranking metric '{other}', expected ic, sharpe or calmar"
            ))),
        }
    }
}

impl fmt::Display for RankingMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ic => "ic",
            Self::Sharpe => "sharpe",
            Self::Calmar => "calmar",
        };
        f.write_str(name)
    }
}

/// Score of one ranked factor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorRanking {
    /// Provider name
    pub name: String,
    /// Metric value
    pub score: f64,
}

/// Score a single factor.
///
/// # Arguments
///
/// * `provider` - Signal source
/// * `prices` - Price history the signal is computed from
/// * `metric` - Ranking metric
/// * `config` - Backtest settings for the Sharpe and Calmar metrics
///
/// # Errors
///
/// Propagates provider and backtest errors. Returns
/// [`RondaError::InsufficientData`] if the signal has no defined value.
pub fn evaluate_factor(
    provider: &dyn SignalProvider,
    prices: &PriceTable,
    metric: RankingMetric,
    config: &BacktestConfig,
) -> Result<f64> {
    let signal = provider.compute(prices)?;
    if signal.values().iter().all(|v| v.is_nan()) {
        return Err(RondaError::insufficient(format!(
            "signal '{}' has no defined values",
            provider.name()
        )));
    }

    let score = match metric {
        RankingMetric::Ic => {
            let forward = prices.close().pct_change().shift(-1);
            ic(&signal, &forward, IcMethod::Pearson)
        }
        RankingMetric::Sharpe | RankingMetric::Calmar => {
            let mut engine = BacktestEngine::new(config.clone());
            let report = engine.run_factor_backtest(&signal, prices)?;
            if metric == RankingMetric::Sharpe {
                report.performance.sharpe_ratio
            } else {
                report.performance.calmar_ratio
            }
        }
    };
    debug!(factor = provider.name(), %metric, score, "factor evaluated");
    Ok(score)
}

/// Rank factors by `metric`, best first.
///
/// Factors that fail or score NaN are logged and left out.
///
/// # Example
///
/// ```rust,ignore
/// use ronda_eval::{RankingMetric, rank_factors};
///
/// let ranked = rank_factors(registry.iter(), &prices, RankingMetric::Ic, &config);
/// for entry in &ranked {
///     println!("{:<20} {:.4}", entry.name, entry.score);
/// }
/// ```
pub fn rank_factors<'a, I>(
    providers: I,
    prices: &PriceTable,
    metric: RankingMetric,
    config: &BacktestConfig,
) -> Vec<FactorRanking>
where
    I: IntoIterator<Item = &'a dyn SignalProvider>,
{
    let mut ranked: Vec<FactorRanking> = providers
        .into_iter()
        .filter_map(|provider| match evaluate_factor(provider, prices, metric, config) {
            Ok(score) if score.is_nan() => {
                warn!(factor = provider.name(), %metric, "undefined score, skipping factor");
                None
            }
            Ok(score) => Some(FactorRanking {
                name: provider.name().to_string(),
                score,
            }),
            Err(e) => {
                warn!(factor = provider.name(), error = %e, "factor evaluation failed, skipping");
                None
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}
