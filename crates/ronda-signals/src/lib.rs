//! Signal providers for ronda.
//!
//! This crate holds the registration table the engine reads factors from:
//! - `SignalRegistry`: name to provider lookup with category metadata
//! - `PrecomputedSignal`: a factor column supplied with the data
//! - `FnSignal`: a provider backed by a closure
//!
//! Indicator math lives with the caller. The engine only sees the
//! `SignalProvider` capability.
//!
//! # Example
//!
//! ```ignore
//! use ronda_signals::{FnSignal, SignalCategory, SignalInfo, SignalRegistry};
//!
//! let mut registry = SignalRegistry::new();
//! registry.register(
//!     SignalInfo::new("reversal", SignalCategory::Reversion),
//!     FnSignal::new("reversal", |prices, _| Ok(prices.close().pct_change().map(|r| -r))),
//! )?;
//!
//! let signal = registry.compute("reversal", &prices, &Default::default())?;
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod providers;
pub mod registry;

// Re-export key types
pub use providers::{FnSignal, PrecomputedSignal};
pub use registry::{SignalCategory, SignalInfo, SignalRegistry};
