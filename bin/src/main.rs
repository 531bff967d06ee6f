//! Ronda CLI binary.
//!
//! Provides command-line access to the Ronda factor evaluation engine.

mod cmd;
mod data;
mod settings;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cmd::OutputFormat;
use ronda_traits::ErrorReport;
use settings::Settings;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ronda")]
#[command(about = "Factor evaluation and backtesting engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Comprehensive IC analysis of a signal column
    Ic {
        /// CSV file with a timestamp column, close prices and factor columns
        data: PathBuf,

        /// Factor column to analyze
        #[arg(short, long)]
        signal: String,

        /// Forecast horizons
        #[arg(short, long, value_delimiter = ',', default_value = "1,3,5,10,20")]
        periods: Vec<usize>,

        /// Correlation method (pearson, spearman, kendall)
        #[arg(short, long, default_value = "pearson")]
        method: String,

        /// Rolling IC window
        #[arg(short, long)]
        window: Option<usize>,

        /// Number of quantile buckets
        #[arg(short, long, default_value = "5")]
        quantiles: usize,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Run a signal-driven backtest
    Backtest {
        /// CSV file with a timestamp column, close prices and factor columns
        data: PathBuf,

        /// Factor column that drives trading
        #[arg(short, long)]
        signal: String,

        /// Buy when the signal is above this value
        #[arg(long, default_value = "0.02", allow_negative_numbers = true)]
        upper: f64,

        /// Sell when the signal is below this value
        #[arg(long, default_value = "-0.02", allow_negative_numbers = true)]
        lower: f64,

        /// Units per trade
        #[arg(long, default_value = "1.0")]
        size: f64,

        /// Starting cash (overrides BACKTEST_INITIAL_CAPITAL)
        #[arg(long)]
        capital: Option<f64>,

        /// Commission rate (overrides BACKTEST_COMMISSION)
        #[arg(long)]
        commission: Option<f64>,

        /// Slippage rate (overrides BACKTEST_SLIPPAGE)
        #[arg(long)]
        slippage: Option<f64>,

        /// Decide every n-th step
        #[arg(long, default_value = "1")]
        rebalance: usize,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Run a quantile-stratified backtest
    Quantile {
        /// CSV file with a timestamp column, close prices and factor columns
        data: PathBuf,

        /// Factor column to bucket by
        #[arg(short, long)]
        signal: String,

        /// Number of buckets
        #[arg(short, long, default_value = "5")]
        quantiles: usize,

        /// Skip the long/short series
        #[arg(long)]
        no_long_short: bool,

        /// Long/short pairing
        #[arg(long, value_enum, default_value = "truncated")]
        pairing: cmd::quantile::Pairing,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Performance metrics of a return series
    Performance {
        /// CSV file with a timestamp column and a returns column
        data: PathBuf,

        /// Returns column
        #[arg(short, long, default_value = "returns")]
        returns: String,

        /// Benchmark returns column
        #[arg(short, long)]
        benchmark: Option<String>,

        /// Also compute rolling metrics over this window
        #[arg(short, long)]
        window: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Rank every factor column of a CSV file
    Rank {
        /// CSV file with a timestamp column, close prices and factor columns
        data: PathBuf,

        /// Ranking metric (ic, sharpe, calmar)
        #[arg(short, long, default_value = "ic")]
        metric: String,

        /// Per-factor time limit in seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Grade a factor column
    Score {
        /// CSV file with a timestamp column, close prices and factor columns
        data: PathBuf,

        /// Factor column to grade
        #[arg(short, long)]
        signal: String,

        /// Correlation method (pearson, spearman, kendall)
        #[arg(short, long, default_value = "pearson")]
        method: String,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl Commands {
    const fn format(&self) -> OutputFormat {
        match self {
            Self::Ic { format, .. }
            | Self::Backtest { format, .. }
            | Self::Quantile { format, .. }
            | Self::Performance { format, .. }
            | Self::Rank { format, .. }
            | Self::Score { format, .. } => *format,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.command.format();

    if let Err(e) = run(cli).await {
        match format {
            OutputFormat::Json => {
                let report = ErrorReport {
                    error: format!("{e:#}"),
                };
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{}", json),
                    Err(_) => eprintln!("Error: {:#}", e),
                }
            }
            OutputFormat::Text => eprintln!("Error: {:#}", e),
        }
        process::exit(1);
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_env()?;
    init_tracing(&settings.log_level);

    match cli.command {
        Commands::Ic {
            data,
            signal,
            periods,
            method,
            window,
            quantiles,
            format,
        } => {
            let args = cmd::ic::IcArgs {
                signal,
                periods,
                method: method.parse()?,
                window: window.unwrap_or(settings.rolling_window),
                quantiles,
            };
            cmd::ic::run_ic(&data, &args, format)?;
        }
        Commands::Backtest {
            data,
            signal,
            upper,
            lower,
            size,
            capital,
            commission,
            slippage,
            rebalance,
            format,
        } => {
            let mut config = settings.backtest.clone();
            config.initial_capital = capital.unwrap_or(config.initial_capital);
            config.commission_rate = commission.unwrap_or(config.commission_rate);
            config.slippage_rate = slippage.unwrap_or(config.slippage_rate);
            config.rebalance_frequency = rebalance;
            config.symbol = signal.clone();
            let rule = ronda_traits::ThresholdStrategy { upper, lower, size };
            cmd::backtest::run_backtest(&data, &signal, config, settings.performance, &rule, format)?;
        }
        Commands::Quantile {
            data,
            signal,
            quantiles,
            no_long_short,
            pairing,
            format,
        } => {
            let config = ronda_eval::QuantileBacktestConfig {
                quantiles,
                long_short: !no_long_short,
                pairing: pairing.into(),
            };
            cmd::quantile::run_quantile(&data, &signal, &config, settings.performance, format)?;
        }
        Commands::Performance {
            data,
            returns,
            benchmark,
            window,
            format,
        } => {
            cmd::performance::run_performance(
                &data,
                &returns,
                benchmark.as_deref(),
                window,
                settings.performance,
                format,
            )?;
        }
        Commands::Rank {
            data,
            metric,
            timeout,
            format,
        } => {
            let metric = metric.parse()?;
            cmd::rank::run_rank(&data, metric, timeout, settings.backtest.clone(), format).await?;
        }
        Commands::Score {
            data,
            signal,
            method,
            format,
        } => {
            cmd::score::run_score(&data, &signal, method.parse()?, settings.rolling_window, format)?;
        }
    }

    Ok(())
}
