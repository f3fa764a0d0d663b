//! Grid search over spread window and z-score bands
//!
//! Every combination runs the full pipeline (spread, signals, backtest,
//! metrics). Failures and thin results are skipped rather than surfaced, so
//! one bad combination never aborts the sweep.

use super::config::{GridSearchConfig, ParameterConfig};
use crate::backtest::run_backtest;
use crate::error::{PairsError, Result};
use crate::logging::{NoProgress, SweepProgress};
use crate::metrics::{compute_metrics, PerformanceMetrics};
use crate::spread::build_spread;
use crate::strategy::generate_signals;
use crate::types::PriceTable;
use polars::prelude::{DataFrame, NamedFrom, Series};
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use tracing::{debug, info, warn};

/// Metrics for one evaluated configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunRecord {
    #[serde(flatten)]
    pub params: ParameterConfig,
    /// Post-warmup rows the backtest ran over
    pub observations: usize,
    #[serde(flatten)]
    pub metrics: PerformanceMetrics,
}

/// A run that passed the quality filters, with derived ratios
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridSearchRow {
    #[serde(flatten)]
    pub run: RunRecord,
    /// total_return / num_trades, NaN without trades
    pub return_per_trade: f64,
    /// max_drawdown / |total_return|, NaN for a zero return
    pub drawdown_to_return: f64,
}

impl GridSearchRow {
    pub fn from_run(run: RunRecord) -> Self {
        let m = &run.metrics;
        let return_per_trade = if m.num_trades > 0 {
            m.total_return / m.num_trades as f64
        } else {
            f64::NAN
        };
        let drawdown_to_return = if m.total_return != 0.0 {
            m.max_drawdown / m.total_return.abs()
        } else {
            f64::NAN
        };
        Self {
            run,
            return_per_trade,
            drawdown_to_return,
        }
    }

    pub fn params(&self) -> ParameterConfig {
        self.run.params
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.run.metrics
    }

    pub fn sharpe_ratio(&self) -> f64 {
        self.run.metrics.sharpe_ratio
    }

    pub fn total_return(&self) -> f64 {
        self.run.metrics.total_return
    }
}

/// Ranked grid search output, best configuration first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GridSearchResult {
    rows: Vec<GridSearchRow>,
}

impl GridSearchResult {
    /// Column set of [`GridSearchResult::to_dataframe`], present even with no rows
    pub const COLUMNS: [&'static str; 16] = [
        "lookback",
        "entry_z",
        "exit_z",
        "observations",
        "total_return",
        "sharpe_ratio",
        "sortino_ratio",
        "max_drawdown",
        "win_rate",
        "num_trades",
        "turnover",
        "avg_win",
        "avg_loss",
        "profit_factor",
        "return_per_trade",
        "drawdown_to_return",
    ];

    /// Rank rows by Sharpe (desc), total return (desc), max drawdown (asc).
    /// The sort is stable and NaN keys go last.
    pub fn from_rows(mut rows: Vec<GridSearchRow>) -> Self {
        rows.sort_by(|x, y| {
            cmp_desc_nan_last(x.sharpe_ratio(), y.sharpe_ratio())
                .then_with(|| cmp_desc_nan_last(x.total_return(), y.total_return()))
                .then_with(|| {
                    cmp_asc_nan_last(x.metrics().max_drawdown, y.metrics().max_drawdown)
                })
        });
        Self { rows }
    }

    pub fn rows(&self) -> &[GridSearchRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<GridSearchRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn best(&self) -> Option<&GridSearchRow> {
        self.rows.first()
    }

    /// Leading `n` rows (fewer if the result is shorter)
    pub fn top(&self, n: usize) -> &[GridSearchRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GridSearchRow> {
        self.rows.iter()
    }

    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let f = |get: fn(&GridSearchRow) -> f64| -> Vec<f64> { self.rows.iter().map(get).collect() };
        let u = |get: fn(&GridSearchRow) -> usize| -> Vec<u64> {
            self.rows.iter().map(|r| get(r) as u64).collect()
        };

        let columns = vec![
            Series::new("lookback", u(|r| r.run.params.lookback)),
            Series::new("entry_z", f(|r| r.run.params.entry_z)),
            Series::new("exit_z", f(|r| r.run.params.exit_z)),
            Series::new("observations", u(|r| r.run.observations)),
            Series::new("total_return", f(|r| r.run.metrics.total_return)),
            Series::new("sharpe_ratio", f(|r| r.run.metrics.sharpe_ratio)),
            Series::new("sortino_ratio", f(|r| r.run.metrics.sortino_ratio)),
            Series::new("max_drawdown", f(|r| r.run.metrics.max_drawdown)),
            Series::new("win_rate", f(|r| r.run.metrics.win_rate)),
            Series::new("num_trades", u(|r| r.run.metrics.num_trades)),
            Series::new("turnover", f(|r| r.run.metrics.turnover)),
            Series::new("avg_win", f(|r| r.run.metrics.avg_win)),
            Series::new("avg_loss", f(|r| r.run.metrics.avg_loss)),
            Series::new("profit_factor", f(|r| r.run.metrics.profit_factor)),
            Series::new("return_per_trade", f(|r| r.return_per_trade)),
            Series::new("drawdown_to_return", f(|r| r.drawdown_to_return)),
        ];
        Ok(DataFrame::new(columns)?)
    }
}

impl<'a> IntoIterator for &'a GridSearchResult {
    type Item = &'a GridSearchRow;
    type IntoIter = std::slice::Iter<'a, GridSearchRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Descending order with NaN after every number
pub(crate) fn cmp_desc_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Ascending order with NaN after every number
pub(crate) fn cmp_asc_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn evaluate(prices: &PriceTable, params: ParameterConfig) -> Result<RunRecord> {
    params.validate()?;
    let spread = build_spread(prices, params.lookback)?;
    if spread.len() < 2 {
        return Err(PairsError::InsufficientData {
            expected: 2,
            actual: spread.len(),
        });
    }
    let signals = generate_signals(&spread, params.entry_z, params.exit_z)?;
    let bt = run_backtest(&signals);
    Ok(RunRecord {
        params,
        observations: bt.len(),
        metrics: compute_metrics(&bt),
    })
}

/// Run the full pipeline for one configuration.
///
/// Returns `None` when the configuration cannot be evaluated: invalid
/// thresholds, a zero lookback, or fewer than two post-warmup rows.
pub fn single_run(
    prices: &PriceTable,
    lookback: usize,
    entry_z: f64,
    exit_z: f64,
) -> Option<RunRecord> {
    let params = ParameterConfig {
        lookback,
        entry_z,
        exit_z,
    };
    match evaluate(prices, params) {
        Ok(run) => Some(run),
        Err(e) => {
            debug!(lookback, entry_z, exit_z, error = %e, "Skipping configuration");
            None
        }
    }
}

/// Exhaustive search over `cfg`, ranked best first.
///
/// Combinations with `entry_z <= exit_z` are never evaluated. Runs with
/// fewer than `min_obs` rows or `min_trades` trades are dropped.
pub fn grid_search(prices: &PriceTable, cfg: &GridSearchConfig) -> GridSearchResult {
    grid_search_with_progress(prices, cfg, &NoProgress)
}

/// [`grid_search`] reporting each finished combination to `progress`
pub fn grid_search_with_progress(
    prices: &PriceTable,
    cfg: &GridSearchConfig,
    progress: &dyn SweepProgress,
) -> GridSearchResult {
    if prices.is_empty() {
        warn!("Empty price table provided to grid search");
        return GridSearchResult::default();
    }

    let combinations: Vec<ParameterConfig> = cfg.combinations().collect();
    let total = combinations.len();
    info!(
        combinations = total,
        skipped = cfg.grid_size() - total,
        rows = prices.len(),
        parallel = cfg.parallel,
        "Starting grid search"
    );

    let completed = AtomicUsize::new(0);
    let run_one = |params: &ParameterConfig| {
        let run = single_run(prices, params.lookback, params.entry_z, params.exit_z);
        let done = completed.fetch_add(1, AtomicOrdering::Relaxed) + 1;
        progress.on_progress(done, total);
        run
    };

    // Indexed collect keeps enumeration order in both modes
    let runs: Vec<Option<RunRecord>> = if cfg.parallel {
        combinations.par_iter().map(|p| run_one(p)).collect()
    } else {
        combinations.iter().map(|p| run_one(p)).collect()
    };

    let rows: Vec<GridSearchRow> = runs
        .into_iter()
        .flatten()
        .filter(|run| run.observations >= cfg.min_obs && run.metrics.num_trades >= cfg.min_trades)
        .map(GridSearchRow::from_run)
        .collect();

    if rows.is_empty() {
        warn!(combinations = total, "No configurations passed quality filters");
    } else {
        info!(valid = rows.len(), combinations = total, "Grid search complete");
    }

    GridSearchResult::from_rows(rows)
}

/// Top-ranked configuration, if any survives the filters
pub fn best_config(prices: &PriceTable, cfg: &GridSearchConfig) -> Option<GridSearchRow> {
    grid_search(prices, cfg).into_rows().into_iter().next()
}
