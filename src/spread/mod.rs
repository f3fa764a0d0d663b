//! Spread Builder
//!
//! Turns a [`PriceTable`] into a [`SpreadTable`]: rolling hedge ratio,
//! hedge-adjusted spread, rolling mean/std of the spread and its z-score.
//! Warmup rows where the rolling statistics are undefined are dropped.

use crate::error::{PairsError, Result};
use crate::math::{mean, rolling_covariance, rolling_mean, rolling_std, rolling_variance, sample_std};
use crate::types::{PriceTable, SpreadTable};
use serde::Serialize;
use tracing::debug;

/// Thresholds reported by [`zscore_summary`] by default
pub const DEFAULT_EXCEEDANCE_LEVELS: [f64; 5] = [1.0, 1.5, 2.0, 2.5, 3.0];

/// Build the spread table for a rolling window of `lookback` rows.
///
/// Output has `len - (lookback - 1)` rows (empty when the input is shorter
/// than the window, or when `lookback == 1` since a single-value sample std
/// is undefined). Every z-score is finite; a zero spread std yields z = 0.
///
/// # Errors
/// `InvalidRange` if `lookback == 0`.
pub fn build_spread(prices: &PriceTable, lookback: usize) -> Result<SpreadTable> {
    if lookback == 0 {
        return Err(PairsError::InvalidRange(
            "lookback must be at least 1".to_string(),
        ));
    }

    let a = prices.asset_a();
    let b = prices.asset_b();

    let beta = hedge_ratio(a, b, lookback)?;
    let spread: Vec<f64> = a
        .iter()
        .zip(b)
        .zip(&beta)
        .map(|((pa, pb), beta)| pa - beta * pb)
        .collect();
    let spread_mean = rolling_mean(&spread, lookback)?;
    let spread_std = rolling_std(&spread, lookback)?;

    let keep: Vec<usize> = (0..prices.len())
        .filter(|&i| !spread_mean[i].is_nan() && !spread_std[i].is_nan())
        .collect();

    debug!(
        rows = prices.len(),
        kept = keep.len(),
        lookback,
        "Built spread"
    );

    let gather = |values: &[f64]| -> Vec<f64> { keep.iter().map(|&i| values[i]).collect() };

    let zscore = keep
        .iter()
        .map(|&i| zscore(spread[i], spread_mean[i], spread_std[i]))
        .collect();

    Ok(SpreadTable {
        prices: PriceTable {
            names: prices.names.clone(),
            index: keep.iter().map(|&i| prices.index[i]).collect(),
            asset_a: gather(a),
            asset_b: gather(b),
        },
        lookback,
        beta: gather(&beta),
        spread: gather(&spread),
        spread_mean: gather(&spread_mean),
        spread_std: gather(&spread_std),
        zscore,
    })
}

/// Rolling hedge ratio `Cov(A, B) / Var(B)` aligned with the input rows.
///
/// Undefined windows (warmup, zero variance in B) take the next defined
/// value; rows after the last defined value keep it. Zero everywhere when no
/// window defines a ratio.
///
/// # Errors
/// `Polars` if a rolling kernel fails.
pub fn hedge_ratio(a: &[f64], b: &[f64], lookback: usize) -> Result<Vec<f64>> {
    let cov = rolling_covariance(a, b, lookback)?;
    let var = rolling_variance(b, lookback)?;

    let mut filled: Vec<Option<f64>> = cov
        .iter()
        .zip(&var)
        .map(|(c, v)| Some(c / v).filter(|beta| beta.is_finite()))
        .collect();

    let mut next = None;
    for slot in filled.iter_mut().rev() {
        if slot.is_some() {
            next = *slot;
        } else {
            *slot = next;
        }
    }

    let mut last = 0.0;
    Ok(filled
        .into_iter()
        .map(|slot| {
            if let Some(v) = slot {
                last = v;
            }
            last
        })
        .collect())
}

/// Distribution of a spread's z-score, used to pick sensible entry bands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZScoreSummary {
    pub observations: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
    /// `(level, share of rows with |z| > level)`
    pub exceedance: Vec<(f64, f64)>,
}

/// Summarise the z-score column. Statistics are NaN and shares 0 when empty.
pub fn zscore_summary(spread: &SpreadTable, levels: &[f64]) -> ZScoreSummary {
    let z = spread.zscore();
    let share = |level: f64| {
        if z.is_empty() {
            0.0
        } else {
            z.iter().filter(|v| v.abs() > level).count() as f64 / z.len() as f64
        }
    };
    ZScoreSummary {
        observations: z.len(),
        min: z.iter().copied().reduce(f64::min).unwrap_or(f64::NAN),
        max: z.iter().copied().reduce(f64::max).unwrap_or(f64::NAN),
        mean: mean(z),
        std: sample_std(z),
        exceedance: levels.iter().map(|&level| (level, share(level))).collect(),
    }
}

fn zscore(spread: f64, mean: f64, std: f64) -> f64 {
    if std == 0.0 {
        return 0.0;
    }
    let z = (spread - mean) / std;
    if z.is_finite() {
        z
    } else {
        0.0
    }
}
