//! CLI subcommand modules.
//!
//! This module contains the implementations for all ronda CLI subcommands.

pub(crate) mod backtest;
pub(crate) mod ic;
pub(crate) mod performance;
pub(crate) mod quantile;
pub(crate) mod rank;
pub(crate) mod score;

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

/// Output format shared by all subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable report
    Text,
    /// Pretty-printed JSON on stdout
    Json,
}

/// Print `value` as pretty JSON.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| anyhow::anyhow!("JSON serialization error: {}", e))?;
    println!("{}", json);
    Ok(())
}

/// Print a boxed section title.
pub(crate) fn banner(title: &str) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:^60} ║", title);
    println!("╚══════════════════════════════════════════════════════════════╝\n");
}

/// Format a ratio as a percentage, `n/a` when undefined.
pub(crate) fn pct(value: f64) -> String {
    if value.is_finite() {
        format!("{:>9.2}%", value * 100.0)
    } else {
        format!("{:>10}", "n/a")
    }
}

/// Format a number with four decimals, `n/a` when undefined.
pub(crate) fn num(value: f64) -> String {
    if value.is_finite() {
        format!("{:>10.4}", value)
    } else {
        format!("{:>10}", "n/a")
    }
}
