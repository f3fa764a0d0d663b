//! Combined optimisation analysis with a robustness verdict

use super::config::{AnalysisConfig, GridSearchConfig};
use super::costs::{cost_sensitivity, CostRow};
use super::grid::{grid_search_with_progress, GridSearchResult};
use super::robustness::{robustness_analysis, RobustnessRow};
use super::stability::{identify_stable_regions, StabilityReport};
use super::walk_forward::{walk_forward_validation, WalkForwardReport};
use crate::error::Result;
use crate::logging::{NoProgress, SweepProgress};
use crate::types::PriceTable;
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Walk-forward degradation (%) a robust configuration stays under
pub const MAX_ROBUST_DEGRADATION: f64 = 30.0;

/// Zero-cost Sharpe a robust configuration must exceed
pub const MIN_ROBUST_SHARPE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Verdict {
    Robust,
    NeedsRefinement { reasons: Vec<String> },
}

impl Verdict {
    pub fn is_robust(&self) -> bool {
        matches!(self, Verdict::Robust)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Robust => write!(f, "robust"),
            Verdict::NeedsRefinement { reasons } => {
                write!(f, "needs refinement: {}", reasons.join("; "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Full-history zero-cost grid
    pub grid: GridSearchResult,
    pub walk_forward: WalkForwardReport,
    pub robustness: Vec<RobustnessRow>,
    pub costs: Vec<CostRow>,
    pub stability: StabilityReport,
}

impl AnalysisReport {
    /// Robust when out-of-sample degradation is small, the leading
    /// configurations form a stable region and the best zero-cost Sharpe is
    /// meaningful. Otherwise lists every failed check.
    pub fn verdict(&self) -> Verdict {
        let mut reasons = Vec::new();

        let degradation = self.walk_forward.sharpe_degradation;
        if !(degradation < MAX_ROBUST_DEGRADATION) {
            reasons.push(format!(
                "walk-forward Sharpe degradation {:.1}% is not below {}%",
                degradation, MAX_ROBUST_DEGRADATION
            ));
        }

        if !self.stability.overall_stable {
            reasons.push("top configurations do not form a stable region".to_string());
        }

        match self.grid.best() {
            Some(best) if best.sharpe_ratio() > MIN_ROBUST_SHARPE => {}
            Some(best) => reasons.push(format!(
                "best zero-cost Sharpe {:.2} is not above {}",
                best.sharpe_ratio(),
                MIN_ROBUST_SHARPE
            )),
            None => reasons.push("no configuration passed the quality filters".to_string()),
        }

        if reasons.is_empty() {
            Verdict::Robust
        } else {
            Verdict::NeedsRefinement { reasons }
        }
    }
}

/// Run every analysis on one price history.
///
/// # Errors
/// `InvalidConfig` if `analysis` fails validation.
pub fn run_analysis(
    prices: &PriceTable,
    cfg: &GridSearchConfig,
    analysis: &AnalysisConfig,
) -> Result<AnalysisReport> {
    run_analysis_with_progress(prices, cfg, analysis, &NoProgress)
}

/// [`run_analysis`] reporting progress of the full-history sweep
pub fn run_analysis_with_progress(
    prices: &PriceTable,
    cfg: &GridSearchConfig,
    analysis: &AnalysisConfig,
    progress: &dyn SweepProgress,
) -> Result<AnalysisReport> {
    analysis.validate()?;

    info!(rows = prices.len(), "Phase 1: walk-forward validation");
    let walk_forward = walk_forward_validation(prices, cfg, analysis.train_fraction)?;

    info!("Phase 2: robustness across periods");
    let robustness = robustness_analysis(prices, cfg, analysis.n_periods)?;

    info!("Phase 3: full grid and transaction costs");
    let grid = grid_search_with_progress(prices, cfg, progress);
    let costs = cost_sensitivity(&grid, &analysis.cost_bps_range);

    info!("Phase 4: stable regions");
    let stability = identify_stable_regions(&grid, analysis.stability_top_n, &analysis.tolerance);

    let report = AnalysisReport {
        grid,
        walk_forward,
        robustness,
        costs,
        stability,
    };
    info!(verdict = %report.verdict(), "Analysis complete");
    Ok(report)
}
