//! Performance command implementation.

use super::{OutputFormat, banner, num, pct, print_json};
use crate::data::read_csv;
use anyhow::Result;
use ronda_eval::{PerformanceAnalyzer, PerformanceConfig, PerformanceReport, RollingMetrics};
use ronda_traits::{TimeSeries, signal_from_column};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct PerformanceOutput {
    #[serde(flatten)]
    report: PerformanceReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    rolling: Option<RollingMetrics>,
}

/// Compute performance metrics for a returns column.
pub(crate) fn run_performance(
    path: &Path,
    returns_column: &str,
    benchmark_column: Option<&str>,
    window: Option<usize>,
    config: PerformanceConfig,
    format: OutputFormat,
) -> Result<()> {
    let frame = read_csv(path)?;
    let returns = signal_from_column(&frame, returns_column)?;
    let benchmark: Option<TimeSeries<f64>> = benchmark_column
        .map(|name| signal_from_column(&frame, name))
        .transpose()?;

    let analyzer = PerformanceAnalyzer::new(config);
    let report = analyzer.comprehensive_analysis(&returns, benchmark.as_ref())?;
    let rolling = window
        .map(|w| analyzer.rolling_analysis(&returns, w))
        .transpose()?;

    let output = PerformanceOutput { report, rolling };
    match format {
        OutputFormat::Json => print_json(&output)?,
        OutputFormat::Text => print_report(returns_column, &output),
    }
    Ok(())
}

fn last_defined(series: &TimeSeries<f64>) -> f64 {
    series
        .values()
        .iter()
        .rev()
        .copied()
        .find(|v| v.is_finite())
        .unwrap_or(f64::NAN)
}

fn print_report(name: &str, output: &PerformanceOutput) {
    let report = &output.report;
    banner("Performance Analysis");

    println!("Series:   {}", name);
    println!("Periods:  {}", report.cumulative_returns.len());
    println!();

    println!("Return Metrics:");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Total Return:      {}", pct(report.total_return));
    println!("  Annualized Return: {}", pct(report.annual_return));
    println!("  Volatility:        {}", pct(report.volatility));
    println!("  Sharpe Ratio:      {}", num(report.sharpe_ratio));
    println!("  Sortino Ratio:     {}", num(report.sortino_ratio));
    println!("  Calmar Ratio:      {}", num(report.calmar_ratio));
    println!();

    println!("Risk Metrics:");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Max Drawdown:      {}", pct(report.max_drawdown));
    if let (Some(peak), Some(trough)) = (report.max_drawdown_peak, report.max_drawdown_trough) {
        println!("  Drawdown Window:   {} -> {}", peak, trough);
    }
    if let Some(duration) = report.max_drawdown_duration {
        println!("  Drawdown Length:   {:>10}", duration);
    }
    println!("  VaR:               {}", pct(report.var));
    println!("  CVaR:              {}", pct(report.cvar));
    println!("  Skewness:          {}", num(report.skewness));
    println!("  Excess Kurtosis:   {}", num(report.kurtosis));
    println!();

    println!("Distribution:");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Win Rate:          {}", pct(report.win_rate));
    println!("  Profit/Loss Ratio: {}", num(report.profit_loss_ratio));
    if let Some(ir) = report.information_ratio {
        println!("  Information Ratio: {}", num(ir));
    }
    if let Some(beta) = report.beta {
        println!("  Beta:              {}", num(beta));
    }
    println!();

    if let Some(rolling) = &output.rolling {
        println!("Rolling ({} periods, latest):", rolling.window);
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("  Sharpe Ratio:      {}", num(last_defined(&rolling.sharpe_ratio)));
        println!("  Volatility:        {}", pct(last_defined(&rolling.volatility)));
        println!("  Max Drawdown:      {}", pct(last_defined(&rolling.max_drawdown)));
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_defined_skips_trailing_nan() {
        let series = TimeSeries::from_values(vec![f64::NAN, 0.5, 0.25, f64::NAN]);
        assert_eq!(last_defined(&series), 0.25);
        assert!(last_defined(&TimeSeries::from_values(vec![f64::NAN])).is_nan());
    }
}
