//! Factor evaluation and backtesting for ronda.
//!
//! This crate provides the analysis core:
//! - Information Coefficient (IC) statistics, rolling IC, decay and
//!   quantile analysis
//! - Performance metrics for a return series
//! - A single-asset, signal-driven backtest with transaction costs
//! - A quantile-stratified backtest
//! - Factor scorecards and batch ranking
//!
//! # Example
//!
//! ```rust,ignore
//! use ronda_eval::{BacktestEngine, IcAnalyzer, IcConfig};
//!
//! let report = IcAnalyzer::new(IcConfig::default())
//!     .comprehensive_analysis(&signal, &prices, &[1, 5, 20])?;
//! println!("IC(1) = {:.4}", report.ic_stats[&1].ic);
//!
//! let mut engine = BacktestEngine::default();
//! let backtest = engine.run_factor_backtest(&signal, &prices)?;
//! println!("Sharpe = {:.2}", backtest.performance.sharpe_ratio);
//! ```

pub mod align;
pub mod analyzer;
pub mod backtest;
pub mod decay;
pub mod ic;
pub mod performance;
pub mod quantile;
pub mod quantile_backtest;
pub mod ranking;
pub mod scoring;

// Re-export main types
pub use align::{AlignedPair, align, align_with};
pub use analyzer::{DEFAULT_PERIODS, IcAnalyzer, IcConfig, IcRecord, IcReport, RollingIcSummary};
pub use backtest::{
    BacktestConfig, BacktestEngine, BacktestReport, BacktestState, Position, Side, Trade, TradeStats,
};
pub use decay::{DecayAnalysis, DecayCurve, ic_decay};
pub use ic::{IcMethod, correlation, ic, ic_ir, rolling_ic};
pub use performance::{
    MaxDrawdown, PerformanceAnalyzer, PerformanceConfig, PerformanceReport, RollingMetrics,
};
pub use quantile::{QuantileAnalysis, QuantileReturn, quantile_buckets, quantile_rank_analysis};
pub use quantile_backtest::{
    LongShortMode, QuantileBacktestConfig, QuantileBacktestReport, QuantileBucketStats,
};
pub use ranking::{FactorRanking, RankingMetric, evaluate_factor, rank_factors};
pub use scoring::{FactorScorecard, Rating, ScoreCheck};
