//! Stable parameter regions
//!
//! Looks at the leading rows of a ranked grid. When the best configurations
//! sit close together in parameter space, small changes to the parameters do
//! not change the outcome much and the median configuration is a safer pick
//! than the single best one.

use super::config::{ParameterConfig, StabilityTolerance};
use super::grid::GridSearchResult;
use crate::error::Result;
use crate::math::median;
use serde::Serialize;

/// Per-parameter median over the inspected rows
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MedianParams {
    /// May be fractional for an even row count
    pub lookback: f64,
    pub entry_z: f64,
    pub exit_z: f64,
}

impl MedianParams {
    /// Round the lookback to the nearest row and validate.
    ///
    /// # Errors
    /// `InvalidThreshold` when the medians do not keep `entry_z > exit_z`.
    pub fn to_config(&self) -> Result<ParameterConfig> {
        ParameterConfig::new(self.lookback.round() as usize, self.entry_z, self.exit_z)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StabilityReport {
    /// Rows inspected (at most `top_n`)
    pub inspected: usize,
    pub lookback_range: Option<(usize, usize)>,
    pub entry_z_range: Option<(f64, f64)>,
    pub exit_z_range: Option<(f64, f64)>,
    pub lookback_stable: bool,
    pub entry_z_stable: bool,
    pub exit_z_stable: bool,
    pub overall_stable: bool,
    /// None when there are no rows
    pub median_params: Option<MedianParams>,
}

impl StabilityReport {
    fn empty() -> Self {
        Self {
            inspected: 0,
            lookback_range: None,
            entry_z_range: None,
            exit_z_range: None,
            lookback_stable: false,
            entry_z_stable: false,
            exit_z_stable: false,
            overall_stable: false,
            median_params: None,
        }
    }
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

fn within(range: (f64, f64), tolerance: f64) -> bool {
    range.1 - range.0 <= tolerance
}

/// Check whether the first `top_n` rows of `results` agree within `tolerance`.
pub fn identify_stable_regions(
    results: &GridSearchResult,
    top_n: usize,
    tolerance: &StabilityTolerance,
) -> StabilityReport {
    let top = results.top(top_n);
    if top.is_empty() {
        return StabilityReport::empty();
    }

    let lookbacks: Vec<f64> = top.iter().map(|r| r.params().lookback as f64).collect();
    let entry_zs: Vec<f64> = top.iter().map(|r| r.params().entry_z).collect();
    let exit_zs: Vec<f64> = top.iter().map(|r| r.params().exit_z).collect();

    let lookback_range = top
        .iter()
        .map(|r| r.params().lookback)
        .fold(None, |acc: Option<(usize, usize)>, v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        });
    let entry_z_range = min_max(&entry_zs);
    let exit_z_range = min_max(&exit_zs);

    let lookback_stable = lookback_range.is_some_and(|(lo, hi)| hi - lo <= tolerance.lookback);
    let entry_z_stable = entry_z_range.is_some_and(|r| within(r, tolerance.entry_z));
    let exit_z_stable = exit_z_range.is_some_and(|r| within(r, tolerance.exit_z));

    StabilityReport {
        inspected: top.len(),
        lookback_range,
        entry_z_range,
        exit_z_range,
        lookback_stable,
        entry_z_stable,
        exit_z_stable,
        overall_stable: lookback_stable && entry_z_stable && exit_z_stable,
        median_params: Some(MedianParams {
            lookback: median(&lookbacks),
            entry_z: median(&entry_zs),
            exit_z: median(&exit_zs),
        }),
    }
}
