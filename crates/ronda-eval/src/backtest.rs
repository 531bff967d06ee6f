//! Single-asset backtest simulator.
//!
//! A run walks the timestamp-aligned signal and price rows in order. Each
//! step asks a [`StrategyRule`] for a decision, executes it against cash and
//! the held position, marks the portfolio to the close and records the
//! step return. Steps depend on the running cash and position, so they are
//! strictly sequential.

use crate::align::align_with;
use crate::performance::{PerformanceAnalyzer, PerformanceConfig, PerformanceReport};
use ronda_traits::{
    FactorSignal, PriceBar, PriceTable, Result, RondaError, StrategyRule, ThresholdStrategy, TimeSeries,
    Timestamp,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Configuration for backtesting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Instrument name recorded on positions and trades
    pub symbol: String,
    /// Starting cash
    pub initial_capital: f64,
    /// Commission as a fraction of traded notional
    pub commission_rate: f64,
    /// Slippage as a fraction of traded notional, charged on both sides
    pub slippage_rate: f64,
    /// Largest position value allowed after a buy, as a fraction of equity
    pub max_position_size: f64,
    /// Decide every `n`th step; 1 decides on every step
    pub rebalance_frequency: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            symbol: "ASSET".to_string(),
            initial_capital: 100_000.0,
            commission_rate: 0.001,
            slippage_rate: 0.0005,
            max_position_size: 1.0,
            rebalance_frequency: 1,
        }
    }
}

impl BacktestConfig {
    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InvalidConfig`] describing the rejected field.
    pub fn validate(&self) -> Result<()> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(RondaError::config("initial_capital must be positive"));
        }
        if !(self.commission_rate.is_finite() && self.commission_rate >= 0.0) {
            return Err(RondaError::config("commission_rate must be non-negative"));
        }
        if !(self.slippage_rate.is_finite() && self.slippage_rate >= 0.0) {
            return Err(RondaError::config("slippage_rate must be non-negative"));
        }
        if !(self.max_position_size.is_finite() && self.max_position_size > 0.0) {
            return Err(RondaError::config("max_position_size must be positive"));
        }
        if self.rebalance_frequency == 0 {
            return Err(RondaError::config("rebalance_frequency must be at least 1"));
        }
        Ok(())
    }
}

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Opens or adds to the position.
    Buy,
    /// Reduces or closes the position.
    Sell,
}

/// A held position. Only exists while `size > 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Instrument
    pub symbol: String,
    /// Units held
    pub size: f64,
    /// Size-weighted average entry price
    pub entry_price: f64,
    /// Time the position was opened
    pub entry_time: Timestamp,
}

/// An executed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Instrument
    pub symbol: String,
    /// Direction
    pub side: Side,
    /// Units traded
    pub size: f64,
    /// Execution price
    pub price: f64,
    /// Execution time
    pub timestamp: Timestamp,
    /// Commission plus slippage paid
    pub commission: f64,
}

/// Mutable state of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestState {
    /// Cash balance
    pub cash: f64,
    /// Open positions by symbol
    pub positions: BTreeMap<String, Position>,
    /// Trade log, in execution order
    pub trades: Vec<Trade>,
    /// Portfolio value per step, anchored at the first aligned row
    pub equity_curve: TimeSeries<f64>,
    /// Step returns, one per step after the anchor
    pub returns: TimeSeries<f64>,
}

impl BacktestState {
    const fn new(initial_capital: f64) -> Self {
        Self {
            cash: initial_capital,
            positions: BTreeMap::new(),
            trades: Vec::new(),
            equity_curve: TimeSeries::empty(),
            returns: TimeSeries::empty(),
        }
    }

    /// Units held of `symbol`, zero if flat.
    pub fn position_size(&self, symbol: &str) -> f64 {
        self.positions.get(symbol).map_or(0.0, |p| p.size)
    }

    /// Cash plus every position marked at `price`.
    pub fn portfolio_value(&self, price: f64) -> f64 {
        self.cash + self.positions.values().map(|p| p.size * price).sum::<f64>()
    }
}

/// Aggregate trade statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    /// Number of trades
    pub total_trades: usize,
    /// Number of buys
    pub buy_trades: usize,
    /// Number of sells
    pub sell_trades: usize,
    /// Commission plus slippage paid over the run
    pub total_commission: f64,
    /// Mean units per trade, zero without trades
    pub avg_trade_size: f64,
}

impl TradeStats {
    /// Summarizes a trade log.
    pub fn from_trades(trades: &[Trade]) -> Self {
        let buy_trades = trades.iter().filter(|t| t.side == Side::Buy).count();
        let avg_trade_size = if trades.is_empty() {
            0.0
        } else {
            trades.iter().map(|t| t.size).sum::<f64>() / trades.len() as f64
        };
        Self {
            total_trades: trades.len(),
            buy_trades,
            sell_trades: trades.len() - buy_trades,
            total_commission: trades.iter().map(|t| t.commission).sum(),
            avg_trade_size,
        }
    }
}

/// Backtest results.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    /// Metrics over the step returns
    pub performance: PerformanceReport,
    /// Trade statistics
    pub trade_stats: TradeStats,
    /// Portfolio value per step
    pub equity_curve: TimeSeries<f64>,
    /// Step returns
    pub returns: TimeSeries<f64>,
    /// Trade log
    pub trades: Vec<Trade>,
    /// Last portfolio value
    pub final_equity: f64,
    /// `final_equity / initial_capital - 1`
    pub total_return: f64,
}

/// Signal-driven single-asset backtest engine.
///
/// State is reset at the start of every run, so repeated runs on the same
/// engine are independent.
///
/// # Example
///
/// ```rust,ignore
/// use ronda_eval::{BacktestConfig, BacktestEngine};
///
/// let mut engine = BacktestEngine::new(BacktestConfig::default());
/// let report = engine.run_factor_backtest(&signal, &prices)?;
/// println!("total return: {:.2}%", report.total_return * 100.0);
/// ```
#[derive(Debug, Clone)]
pub struct BacktestEngine {
    config: BacktestConfig,
    analyzer: PerformanceAnalyzer,
    state: BacktestState,
}

impl Default for BacktestEngine {
    fn default() -> Self {
        Self::new(BacktestConfig::default())
    }
}

impl BacktestEngine {
    /// Create a new engine.
    pub fn new(config: BacktestConfig) -> Self {
        let state = BacktestState::new(config.initial_capital);
        Self {
            config,
            analyzer: PerformanceAnalyzer::default(),
            state,
        }
    }

    /// Use `config` when scoring return streams.
    pub const fn with_performance_config(mut self, config: PerformanceConfig) -> Self {
        self.analyzer = PerformanceAnalyzer::new(config);
        self
    }

    /// The active configuration.
    pub const fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// The analyzer that scores return streams.
    pub const fn analyzer(&self) -> &PerformanceAnalyzer {
        &self.analyzer
    }

    /// State left by the most recent run.
    pub const fn state(&self) -> &BacktestState {
        &self.state
    }

    /// Restores the initial cash and clears positions, trades and curves.
    pub fn reset(&mut self) {
        self.state = BacktestState::new(self.config.initial_capital);
    }

    /// Run a backtest with the default threshold strategy.
    ///
    /// See [`BacktestEngine::run_factor_backtest_with`].
    pub fn run_factor_backtest(&mut self, signal: &FactorSignal, prices: &PriceTable) -> Result<BacktestReport> {
        self.run_factor_backtest_with(signal, prices, &ThresholdStrategy::default())
    }

    /// Run a backtest driven by `strategy`.
    ///
    /// The signal and prices are aligned on timestamp, dropping rows where
    /// either the signal or the close is missing. The first aligned row only
    /// anchors the equity curve at the initial capital. Every later row asks
    /// the strategy for a decision (on rebalance steps), executes it, and
    /// appends the marked equity and the step return. A step whose signal or
    /// close is not finite carries the previous equity forward.
    ///
    /// # Errors
    ///
    /// - [`RondaError::InvalidConfig`] for an invalid configuration
    /// - [`RondaError::InsufficientData`] if fewer than two rows align
    pub fn run_factor_backtest_with<S>(
        &mut self,
        signal: &FactorSignal,
        prices: &PriceTable,
        strategy: &S,
    ) -> Result<BacktestReport>
    where
        S: StrategyRule + ?Sized,
    {
        self.config.validate()?;
        self.reset();

        let rows = align_with(signal, prices, |s: &f64, bar: &PriceBar| {
            !s.is_nan() && !bar.close.is_nan()
        });
        if rows.len() < 2 {
            return Err(RondaError::insufficient(format!(
                "backtest needs at least 2 aligned rows, got {}",
                rows.len()
            )));
        }

        self.state
            .equity_curve
            .push(rows[0].0, self.config.initial_capital)?;
        let mut prev_equity = self.config.initial_capital;

        for (step, (timestamp, value, bar)) in rows.iter().enumerate().skip(1) {
            let equity = if value.is_finite() && bar.close.is_finite() {
                if step % self.config.rebalance_frequency == 0 {
                    let decision = strategy.decide(*value, bar, step);
                    if decision.is_finite() && decision != 0.0 {
                        self.execute_trade(decision, bar.close, *timestamp);
                    }
                }
                self.state.portfolio_value(bar.close)
            } else {
                debug!(%timestamp, "non-finite signal or close, carrying equity forward");
                prev_equity
            };

            let step_return = if prev_equity == 0.0 {
                0.0
            } else {
                (equity - prev_equity) / prev_equity
            };
            self.state.equity_curve.push(*timestamp, equity)?;
            self.state.returns.push(*timestamp, step_return)?;
            prev_equity = equity;
        }

        info!(
            steps = rows.len(),
            trades = self.state.trades.len(),
            final_equity = prev_equity,
            "backtest finished"
        );
        self.generate_results()
    }

    fn trade_cost(&self, size: f64, price: f64) -> f64 {
        let notional = size.abs() * price;
        notional * self.config.commission_rate + notional * self.config.slippage_rate
    }

    /// Executes one decision. Refused trades are skipped, not errors.
    fn execute_trade(&mut self, decision: f64, price: f64, timestamp: Timestamp) {
        if price <= 0.0 {
            debug!(%timestamp, price, "non-positive price, skipping trade");
            return;
        }
        if decision > 0.0 {
            self.buy(decision, price, timestamp);
        } else {
            self.sell(-decision, price, timestamp);
        }
    }

    fn buy(&mut self, size: f64, price: f64, timestamp: Timestamp) {
        let symbol = self.config.symbol.clone();
        let held = self.state.position_size(&symbol);
        let limit = self.config.max_position_size * self.state.portfolio_value(price);
        if (held + size) * price > limit {
            debug!(%timestamp, held, size, limit, "position limit exceeded, skipping buy");
            return;
        }
        let cost = self.trade_cost(size, price);
        let required = size * price + cost;
        if required > self.state.cash {
            debug!(%timestamp, required, cash = self.state.cash, "insufficient cash, skipping buy");
            return;
        }
        self.state.cash -= required;

        self.state
            .positions
            .entry(symbol.clone())
            .and_modify(|pos| {
                let total = pos.size + size;
                pos.entry_price = (pos.size * pos.entry_price + size * price) / total;
                pos.size = total;
            })
            .or_insert_with(|| Position {
                symbol: symbol.clone(),
                size,
                entry_price: price,
                entry_time: timestamp,
            });

        self.state.trades.push(Trade {
            symbol,
            side: Side::Buy,
            size,
            price,
            timestamp,
            commission: cost,
        });
    }

    fn sell(&mut self, units: f64, price: f64, timestamp: Timestamp) {
        let symbol = self.config.symbol.clone();
        let held = self.state.position_size(&symbol);
        if held <= 0.0 {
            debug!(%timestamp, "no position to sell");
            return;
        }

        let size = units.min(held);
        let cost = self.trade_cost(size, price);
        self.state.cash += size * price - cost;

        let remaining = held - size;
        if remaining <= 0.0 {
            self.state.positions.remove(&symbol);
        } else if let Some(pos) = self.state.positions.get_mut(&symbol) {
            pos.size = remaining;
        }

        self.state.trades.push(Trade {
            symbol,
            side: Side::Sell,
            size,
            price,
            timestamp,
            commission: cost,
        });
    }

    fn generate_results(&self) -> Result<BacktestReport> {
        let Some((_, &final_equity)) = self.state.equity_curve.last() else {
            return Err(RondaError::insufficient("backtest produced no equity curve"));
        };
        if self.state.returns.is_empty() {
            return Err(RondaError::insufficient("backtest produced no returns"));
        }

        Ok(BacktestReport {
            performance: self.analyzer.comprehensive_analysis(&self.state.returns, None)?,
            trade_stats: TradeStats::from_trades(&self.state.trades),
            equity_curve: self.state.equity_curve.clone(),
            returns: self.state.returns.clone(),
            trades: self.state.trades.clone(),
            final_equity,
            total_return: final_equity / self.config.initial_capital - 1.0,
        })
    }
}
