//! IC analysis command implementation.

use super::{OutputFormat, banner, num, pct, print_json};
use crate::data::Dataset;
use anyhow::Result;
use ronda_eval::{IcAnalyzer, IcConfig, IcMethod, IcReport};
use std::path::Path;

/// Arguments of the `ic` subcommand.
pub(crate) struct IcArgs {
    pub(crate) signal: String,
    pub(crate) periods: Vec<usize>,
    pub(crate) method: IcMethod,
    pub(crate) window: usize,
    pub(crate) quantiles: usize,
}

/// Run the comprehensive IC analysis of one factor column.
pub(crate) fn run_ic(path: &Path, args: &IcArgs, format: OutputFormat) -> Result<()> {
    let dataset = Dataset::load(path)?;
    let signal = dataset.signal(&args.signal)?;

    let config = IcConfig {
        method: args.method,
        rolling_window: args.window,
        quantiles: args.quantiles,
        ..IcConfig::default()
    };
    let report = IcAnalyzer::new(config).comprehensive_analysis(&signal, &dataset.prices, &args.periods)?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => print_report(&args.signal, &report),
    }
    Ok(())
}

fn print_report(name: &str, report: &IcReport) {
    banner("IC Analysis");

    println!("Signal:       {}", name);
    println!("Method:       {}", report.method);
    println!("Observations: {}", report.observations);
    println!();

    println!("IC by Horizon:");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "  {:>7} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Horizon", "IC", "Mean", "Std", "IR", "Win Rate"
    );
    for (horizon, record) in &report.ic_stats {
        println!(
            "  {:>7} {} {} {} {} {}",
            horizon,
            num(record.ic),
            num(record.ic_mean),
            num(record.ic_std),
            num(record.ic_ir),
            pct(record.ic_win_rate)
        );
    }
    println!();

    if !report.rolling.is_empty() {
        println!("Rolling IC:");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        for summary in &report.rolling {
            println!(
                "  window {:>4}: mean {} std {} min {} max {}",
                summary.window,
                num(summary.mean),
                num(summary.std),
                num(summary.min),
                num(summary.max)
            );
        }
        println!();
    }

    println!("IC Decay:");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (horizon, ic) in report.decay.curve.iter() {
        println!("  {:>4} {}", horizon.to_string(), num(*ic));
    }
    match report.decay.half_life {
        Some(h) => println!("  Half-life: {:.1} periods", h),
        None => println!("  Half-life: n/a"),
    }
    if let Some((horizon, ic)) = report.decay.peak {
        println!("  Peak:      {:.4} at horizon {}", ic, horizon);
    }
    println!();

    println!("Quantile Returns:");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for bucket in &report.quantile.quantile_returns {
        println!("  {:<4} {} ({} rows)", bucket.label, pct(bucket.mean_return), bucket.count);
    }
    println!("  Long/Short:   {}", pct(report.quantile.long_short_return));
    println!("  Monotonicity: {}", num(report.quantile.monotonicity));
    println!();
}
