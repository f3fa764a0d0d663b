//! Optimisation Engine
//!
//! Exhaustive grid search plus the meta-analyses layered on its output:
//! - walk-forward validation (overfitting)
//! - best configuration per chronological period (regime sensitivity)
//! - transaction cost sensitivity
//! - stable parameter regions

pub mod config;
pub mod costs;
pub mod grid;
pub mod report;
pub mod robustness;
pub mod stability;
pub mod walk_forward;

pub use config::{AnalysisConfig, GridSearchConfig, ParameterConfig, StabilityTolerance};
pub use costs::{cost_sensitivity, transaction_cost_analysis, CostRow};
pub use grid::{
    best_config, grid_search, grid_search_with_progress, single_run, GridSearchResult,
    GridSearchRow, RunRecord,
};
pub use report::{run_analysis, run_analysis_with_progress, AnalysisReport, Verdict};
pub use robustness::{robustness_analysis, RobustnessRow};
pub use stability::{identify_stable_regions, MedianParams, StabilityReport};
pub use walk_forward::{walk_forward_validation, Overfitting, WalkForwardReport};
