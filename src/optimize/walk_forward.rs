//! Walk-forward validation
//!
//! Optimises on the leading share of the history and replays the winning
//! configuration, unchanged, on the remaining rows.

use super::config::GridSearchConfig;
use super::grid::{best_config, single_run, GridSearchRow, RunRecord};
use crate::error::{PairsError, Result};
use crate::types::PriceTable;
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// How much of the training Sharpe survived out of sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Overfitting {
    /// Degradation below 20%
    Low,
    /// Degradation below 40%
    Moderate,
    High,
    /// Degradation could not be computed
    Undetermined,
}

impl Overfitting {
    pub fn from_degradation(degradation: f64) -> Self {
        if degradation.is_nan() {
            Overfitting::Undetermined
        } else if degradation < 20.0 {
            Overfitting::Low
        } else if degradation < 40.0 {
            Overfitting::Moderate
        } else {
            Overfitting::High
        }
    }
}

impl fmt::Display for Overfitting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Overfitting::Low => "low degradation, parameters generalise",
            Overfitting::Moderate => "moderate degradation, some overfitting",
            Overfitting::High => "high degradation, significant overfitting",
            Overfitting::Undetermined => "degradation undefined",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkForwardReport {
    pub train_rows: usize,
    pub test_rows: usize,
    /// Best configuration on the training rows
    pub train_best: Option<GridSearchRow>,
    /// Same configuration evaluated on the test rows
    pub test_metrics: Option<RunRecord>,
    /// NaN when there is no training configuration
    pub train_sharpe: f64,
    /// NaN when the test run failed
    pub test_sharpe: f64,
    /// `(train - test) / |train| * 100`
    pub sharpe_degradation: f64,
}

impl WalkForwardReport {
    pub fn overfitting(&self) -> Overfitting {
        Overfitting::from_degradation(self.sharpe_degradation)
    }
}

/// Percentage drop from training to test Sharpe; NaN when the training
/// Sharpe is zero or either side is undefined.
pub fn sharpe_degradation(train_sharpe: f64, test_sharpe: f64) -> f64 {
    if train_sharpe == 0.0 || train_sharpe.is_nan() || test_sharpe.is_nan() {
        return f64::NAN;
    }
    (train_sharpe - test_sharpe) / train_sharpe.abs() * 100.0
}

/// Split chronologically at `floor(len * train_fraction)`, optimise on the
/// first part and evaluate that configuration on the second.
///
/// # Errors
/// `InvalidRange` unless `0 < train_fraction < 1`.
pub fn walk_forward_validation(
    prices: &PriceTable,
    cfg: &GridSearchConfig,
    train_fraction: f64,
) -> Result<WalkForwardReport> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(PairsError::InvalidRange(format!(
            "train_fraction must be between 0 and 1 (exclusive), got {}",
            train_fraction
        )));
    }

    let split = (prices.len() as f64 * train_fraction).floor() as usize;
    let train = prices.slice(0..split);
    let test = prices.slice(split..prices.len());

    info!(
        train_rows = train.len(),
        test_rows = test.len(),
        "Running walk-forward validation"
    );

    let train_best = best_config(&train, cfg);
    let test_metrics = train_best.as_ref().and_then(|best| {
        let p = best.params();
        single_run(&test, p.lookback, p.entry_z, p.exit_z)
    });

    if train_best.is_none() {
        warn!("No valid configuration on the training window");
    }

    let train_sharpe = train_best
        .as_ref()
        .map_or(f64::NAN, GridSearchRow::sharpe_ratio);
    let test_sharpe = test_metrics
        .as_ref()
        .map_or(f64::NAN, |run| run.metrics.sharpe_ratio);

    Ok(WalkForwardReport {
        train_rows: train.len(),
        test_rows: test.len(),
        train_best,
        test_metrics,
        train_sharpe,
        test_sharpe,
        sharpe_degradation: sharpe_degradation(train_sharpe, test_sharpe),
    })
}
