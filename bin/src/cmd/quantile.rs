//! Quantile backtest command implementation.

use super::{OutputFormat, banner, num, pct, print_json};
use crate::data::Dataset;
use anyhow::Result;
use clap::ValueEnum;
use ronda_eval::{
    BacktestConfig, BacktestEngine, LongShortMode, PerformanceConfig, QuantileBacktestConfig,
    QuantileBacktestReport, QuantileBucketStats,
};
use std::path::Path;

/// Long/short pairing accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Pairing {
    /// Pair top and bottom returns by position, truncated to the shorter leg
    Truncated,
    /// Merge both legs in timestamp order
    Chronological,
}

impl From<Pairing> for LongShortMode {
    fn from(pairing: Pairing) -> Self {
        match pairing {
            Pairing::Truncated => Self::Truncated,
            Pairing::Chronological => Self::Chronological,
        }
    }
}

/// Bucket one factor column and score each bucket's forward returns.
pub(crate) fn run_quantile(
    path: &Path,
    signal_name: &str,
    config: &QuantileBacktestConfig,
    performance: PerformanceConfig,
    format: OutputFormat,
) -> Result<()> {
    let dataset = Dataset::load(path)?;
    let signal = dataset.signal(signal_name)?;

    let engine = BacktestEngine::new(BacktestConfig::default()).with_performance_config(performance);
    let report = engine.run_quantile_backtest_with(&signal, &dataset.prices, config)?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => print_report(signal_name, &report),
    }
    Ok(())
}

fn print_bucket(stats: &QuantileBucketStats) {
    println!(
        "  {:<10} {} {} {} {} {:>6}",
        stats.label,
        pct(stats.mean_return),
        pct(stats.std_return),
        num(stats.sharpe_ratio),
        pct(stats.total_return),
        stats.count
    );
}

fn print_report(signal_name: &str, report: &QuantileBacktestReport) {
    banner("Quantile Backtest");

    println!("Signal:       {}", signal_name);
    println!("Observations: {}", report.observations);
    println!("Factor IC:    {}", num(report.factor_ic).trim());
    println!();

    println!(
        "  {:<10} {:>10} {:>10} {:>10} {:>10} {:>6}",
        "Bucket", "Mean", "Std", "Sharpe", "Total", "Rows"
    );
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for bucket in &report.buckets {
        print_bucket(bucket);
    }
    if let Some(long_short) = &report.long_short {
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        print_bucket(long_short);
        println!("  (pairing: {:?})", report.pairing);
    }
    println!();
}
