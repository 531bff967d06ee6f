//! Rank command implementation.

use super::{OutputFormat, banner, num, print_json};
use crate::data::Dataset;
use anyhow::{Context, Result};
use ronda_eval::{BacktestConfig, FactorRanking, RankingMetric, evaluate_factor, rank_factors};
use ronda_signals::SignalRegistry;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{self, JoinSet};
use tokio::time;
use tracing::{info, warn};

#[derive(Serialize)]
struct RankOutput {
    metric: RankingMetric,
    factors: usize,
    ranking: Vec<FactorRanking>,
}

/// Rank every factor column of a CSV file.
///
/// Without a timeout the whole batch runs on one blocking task. With one,
/// each factor gets its own blocking task and is dropped from the ranking if
/// it does not finish in time.
pub(crate) async fn run_rank(
    path: &Path,
    metric: RankingMetric,
    timeout_secs: Option<u64>,
    config: BacktestConfig,
    format: OutputFormat,
) -> Result<()> {
    let dataset = Dataset::load(path)?;
    let registry = SignalRegistry::from_columns(&dataset.frame)?;
    let factors = registry.len();
    info!(factors, %metric, "ranking factors");

    let registry = Arc::new(registry);
    let prices = Arc::new(dataset.prices);
    let ranking = match timeout_secs {
        None => task::spawn_blocking(move || rank_factors(registry.iter(), &prices, metric, &config))
            .await
            .context("ranking task failed")?,
        Some(secs) => rank_with_timeout(registry, prices, metric, config, Duration::from_secs(secs)).await,
    };

    let output = RankOutput {
        metric,
        factors,
        ranking,
    };
    match format {
        OutputFormat::Json => print_json(&output)?,
        OutputFormat::Text => print_report(&output),
    }
    Ok(())
}

async fn rank_with_timeout(
    registry: Arc<SignalRegistry>,
    prices: Arc<ronda_traits::PriceTable>,
    metric: RankingMetric,
    config: BacktestConfig,
    limit: Duration,
) -> Vec<FactorRanking> {
    let mut set = JoinSet::new();
    for name in registry.names().map(str::to_string) {
        let registry = Arc::clone(&registry);
        let prices = Arc::clone(&prices);
        let config = config.clone();
        set.spawn(async move {
            let factor = name.clone();
            let work = task::spawn_blocking(move || {
                let provider = registry.get(&factor)?;
                evaluate_factor(provider, &prices, metric, &config)
            });
            (name, time::timeout(limit, work).await)
        });
    }

    let mut ranking = Vec::new();
    while let Some(joined) = set.join_next().await {
        let Ok((name, outcome)) = joined else {
            warn!("ranking task aborted");
            continue;
        };
        match outcome {
            Err(_) => warn!(factor = %name, ?limit, "factor timed out, skipping"),
            Ok(Err(e)) => warn!(factor = %name, error = %e, "factor task panicked, skipping"),
            Ok(Ok(Err(e))) => warn!(factor = %name, error = %e, "factor evaluation failed, skipping"),
            Ok(Ok(Ok(score))) if score.is_nan() => {
                warn!(factor = %name, %metric, "undefined score, skipping factor");
            }
            Ok(Ok(Ok(score))) => ranking.push(FactorRanking { name, score }),
        }
    }

    ranking.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranking
}

fn print_report(output: &RankOutput) {
    banner("Factor Ranking");

    println!("Metric:  {}", output.metric);
    println!("Ranked:  {} of {} factors", output.ranking.len(), output.factors);
    println!();

    println!("  {:>4}  {:<30} {:>10}", "Rank", "Factor", "Score");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (i, entry) in output.ranking.iter().enumerate() {
        println!("  {:>4}  {:<30} {}", i + 1, entry.name, num(entry.score));
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use ronda_signals::PrecomputedSignal;
    use ronda_traits::{PriceTable, TimeSeries};

    fn fixture() -> (Arc<SignalRegistry>, Arc<PriceTable>) {
        let closes: Vec<f64> = (0..40)
            .map(|i| 100.0 + 8.0 * (f64::from(i) * 0.4).sin())
            .collect();
        let prices = PriceTable::from_closes(&closes);
        let forward = prices.close().pct_change().shift(-1);

        let mut registry = SignalRegistry::new();
        for (name, signal) in [
            ("ahead", forward.clone()),
            ("behind", forward.map(|r| -r)),
            ("blank", TimeSeries::from_values(vec![f64::NAN; 40])),
        ] {
            let info = ronda_signals::SignalInfo::new(name, ronda_signals::SignalCategory::Precomputed);
            registry.register(info, PrecomputedSignal::new(name, signal)).unwrap();
        }
        (Arc::new(registry), Arc::new(prices))
    }

    #[tokio::test]
    async fn test_rank_with_timeout_orders_and_skips() {
        let (registry, prices) = fixture();
        let ranking = rank_with_timeout(
            registry,
            prices,
            RankingMetric::Ic,
            BacktestConfig::default(),
            Duration::from_secs(30),
        )
        .await;

        let names: Vec<&str> = ranking.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["ahead", "behind"]);
        assert!(ranking[0].score > 0.99);
    }

    #[tokio::test]
    async fn test_rank_matches_library_ranking() {
        let (registry, prices) = fixture();
        let expected = rank_factors(registry.iter(), &prices, RankingMetric::Ic, &BacktestConfig::default());
        let ranking = rank_with_timeout(
            Arc::clone(&registry),
            prices,
            RankingMetric::Ic,
            BacktestConfig::default(),
            Duration::from_secs(30),
        )
        .await;
        assert_eq!(ranking, expected);
    }
}
