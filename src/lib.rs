//! Pairs trading research library.
//!
//! ```text
//! PriceTable -> build_spread -> generate_signals -> run_backtest -> compute_metrics
//! ```
//!
//! The [`optimize`] module sweeps the spread window and z-score bands over
//! that pipeline and layers walk-forward, per-period, cost and stability
//! analyses on the ranked results.

pub mod backtest;
pub mod error;
pub mod frame;
pub mod logging;
pub mod math;
pub mod metrics;
pub mod optimize;
pub mod spread;
pub mod strategy;
pub mod types;

pub use backtest::run_backtest;
pub use error::{PairsError, Result};
pub use metrics::{compute_metrics, PerformanceMetrics};
pub use spread::build_spread;
pub use strategy::generate_signals;
pub use types::{BacktestTable, Position, PriceTable, SignalTable, SpreadTable};
