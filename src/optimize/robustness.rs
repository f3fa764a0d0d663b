//! Robustness across market regimes
//!
//! Re-optimises independently on consecutive chronological segments. A
//! strategy whose best configuration drifts a lot between segments is fitted
//! to one regime rather than to the pair.

use super::config::GridSearchConfig;
use super::grid::{best_config, GridSearchRow};
use crate::error::{PairsError, Result};
use crate::types::PriceTable;
use chrono::NaiveDate;
use serde::Serialize;
use std::ops::Range;
use tracing::{debug, info};

/// Best configuration found in one segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobustnessRow {
    /// 1-based segment number
    pub period: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Rows in the segment
    pub observations: usize,
    pub best: GridSearchRow,
}

/// Contiguous row ranges of `len / n_periods` rows; the last range absorbs
/// the remainder.
pub fn period_ranges(len: usize, n_periods: usize) -> Vec<Range<usize>> {
    if n_periods == 0 {
        return Vec::new();
    }
    let size = len / n_periods;
    (0..n_periods)
        .map(|i| {
            let start = i * size;
            let end = if i + 1 == n_periods { len } else { start + size };
            start..end
        })
        .collect()
}

/// Best configuration per segment; segments without a valid configuration
/// are left out, so the output may hold fewer than `n_periods` rows.
///
/// # Errors
/// `InvalidRange` if `n_periods < 2`.
pub fn robustness_analysis(
    prices: &PriceTable,
    cfg: &GridSearchConfig,
    n_periods: usize,
) -> Result<Vec<RobustnessRow>> {
    if n_periods < 2 {
        return Err(PairsError::InvalidRange(format!(
            "n_periods must be at least 2, got {}",
            n_periods
        )));
    }

    info!(n_periods, rows = prices.len(), "Running robustness analysis");

    let mut rows = Vec::with_capacity(n_periods);
    for (i, range) in period_ranges(prices.len(), n_periods).into_iter().enumerate() {
        let segment = prices.slice(range);
        let Some((start, end)) = segment.date_span() else {
            debug!(period = i + 1, "Empty segment");
            continue;
        };
        match best_config(&segment, cfg) {
            Some(best) => rows.push(RobustnessRow {
                period: i + 1,
                start,
                end,
                observations: segment.len(),
                best,
            }),
            None => debug!(period = i + 1, "No valid configuration in segment"),
        }
    }
    Ok(rows)
}
