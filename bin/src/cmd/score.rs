//! Score command implementation.

use super::{OutputFormat, banner, num, print_json};
use crate::data::Dataset;
use anyhow::Result;
use ronda_eval::{FactorScorecard, IcAnalyzer, IcConfig, IcMethod};
use serde::Serialize;
use std::path::Path;

/// Horizons the scorecard reads.
const SCORE_PERIODS: [usize; 2] = [1, 5];

#[derive(Serialize)]
struct ScoreOutput<'a> {
    signal: &'a str,
    #[serde(flatten)]
    scorecard: FactorScorecard,
}

/// Grade one factor column.
pub(crate) fn run_score(
    path: &Path,
    signal_name: &str,
    method: IcMethod,
    rolling_window: usize,
    format: OutputFormat,
) -> Result<()> {
    let dataset = Dataset::load(path)?;
    let signal = dataset.signal(signal_name)?;

    let config = IcConfig {
        method,
        rolling_window,
        ..IcConfig::default()
    };
    let report = IcAnalyzer::new(config).comprehensive_analysis(&signal, &dataset.prices, &SCORE_PERIODS)?;
    let scorecard = FactorScorecard::evaluate(&report.ic_stats, Some(report.quantile.long_short_return));

    let output = ScoreOutput {
        signal: signal_name,
        scorecard,
    };
    match format {
        OutputFormat::Json => print_json(&output)?,
        OutputFormat::Text => print_report(&output),
    }
    Ok(())
}

fn print_report(output: &ScoreOutput<'_>) {
    banner("Factor Scorecard");

    println!("Signal: {}", output.signal);
    println!();

    println!("  {:<16} {:>10} {:>10}", "Check", "Value", "Score");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for check in &output.scorecard.checks {
        println!("  {:<16} {} {:>10.1}", check.name, num(check.value), check.score);
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  {:<16} {:>10} {:>10.2}", "Overall", "", output.scorecard.score);
    println!("  Rating: {}", output.scorecard.rating);
    println!();
}
