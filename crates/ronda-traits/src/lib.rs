#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ronda/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core data model for the Ronda factor research engine.
//!
//! This crate provides the time-indexed containers exchanged between the
//! analyzers, the capability traits they depend on, and the shared error type.

// Module declarations
pub mod error;
pub mod price;
pub mod signal;
pub mod stats;
pub mod strategy;
pub mod types;

// Re-exports
pub use error::{ErrorReport, Result, RondaError};
pub use price::{PriceBar, PriceTable, factor_columns, signal_from_column};
pub use signal::{SignalParams, SignalProvider};
pub use strategy::{StrategyRule, ThresholdStrategy};
pub use types::{CE_TO_UNIX_EPOCH_DAYS, FactorSignal, TimeSeries, Timestamp};

