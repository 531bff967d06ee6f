//! Backtest command implementation.

use super::{OutputFormat, banner, num, pct, print_json};
use crate::data::Dataset;
use anyhow::Result;
use ronda_eval::{BacktestConfig, BacktestEngine, BacktestReport, PerformanceConfig};
use ronda_traits::ThresholdStrategy;
use std::path::Path;

/// Run a threshold-driven backtest over one factor column.
pub(crate) fn run_backtest(
    path: &Path,
    signal_name: &str,
    config: BacktestConfig,
    performance: PerformanceConfig,
    rule: &ThresholdStrategy,
    format: OutputFormat,
) -> Result<()> {
    let dataset = Dataset::load(path)?;
    let signal = dataset.signal(signal_name)?;

    let mut engine = BacktestEngine::new(config).with_performance_config(performance);
    let result = engine.run_factor_backtest_with(&signal, &dataset.prices, rule)?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Text => print_report(signal_name, engine.config(), rule, &result),
    }
    Ok(())
}

fn print_report(
    signal_name: &str,
    config: &BacktestConfig,
    rule: &ThresholdStrategy,
    result: &BacktestReport,
) {
    banner("Backtest Results");

    println!("Signal:     {}", signal_name);
    println!("Capital:    {:.2}", config.initial_capital);
    println!("Costs:      {:.4} commission, {:.4} slippage", config.commission_rate, config.slippage_rate);
    println!("Rule:       buy > {}, sell < {}, size {}", rule.upper, rule.lower, rule.size);
    println!("Steps:      {}", result.equity_curve.len());
    println!();

    let perf = &result.performance;
    println!("Performance Metrics:");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Final Equity:      {:>10.2}", result.final_equity);
    println!("  Total Return:      {}", pct(result.total_return));
    println!("  Annualized Return: {}", pct(perf.annual_return));
    println!("  Volatility:        {}", pct(perf.volatility));
    println!("  Sharpe Ratio:      {}", num(perf.sharpe_ratio));
    println!("  Sortino Ratio:     {}", num(perf.sortino_ratio));
    println!("  Calmar Ratio:      {}", num(perf.calmar_ratio));
    println!("  Max Drawdown:      {}", pct(perf.max_drawdown));
    println!("  Win Rate:          {}", pct(perf.win_rate));
    println!();

    let stats = &result.trade_stats;
    println!("Trading Statistics:");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Trades:            {:>10}", stats.total_trades);
    println!("  Buys / Sells:      {:>4} / {}", stats.buy_trades, stats.sell_trades);
    println!("  Costs Paid:        {:>10.2}", stats.total_commission);
    println!("  Avg Trade Size:    {}", num(stats.avg_trade_size));
    println!();
}
