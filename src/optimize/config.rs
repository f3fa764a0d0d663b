//! Configuration for parameter optimisation and the follow-up analyses

use crate::error::{PairsError, Result};
use crate::strategy::Thresholds;
use serde::{Deserialize, Serialize};

/// One strategy configuration: spread window plus entry/exit bands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterConfig {
    /// Rolling window for hedge ratio and z-score (rows)
    pub lookback: usize,
    /// |z| above which a position is opened
    pub entry_z: f64,
    /// |z| at or below which a position is closed (must be < entry_z)
    pub exit_z: f64,
}

impl ParameterConfig {
    /// # Errors
    /// `InvalidRange` for a zero lookback, `InvalidThreshold` unless `entry_z > exit_z`.
    pub fn new(lookback: usize, entry_z: f64, exit_z: f64) -> Result<Self> {
        let config = Self {
            lookback,
            entry_z,
            exit_z,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lookback == 0 {
            return Err(PairsError::InvalidRange(
                "lookback must be at least 1".to_string(),
            ));
        }
        Thresholds::new(self.entry_z, self.exit_z)?;
        Ok(())
    }
}

/// Parameter grid and quality filters for [`grid_search`](super::grid_search)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSearchConfig {
    /// Rolling windows to test
    pub lookbacks: Vec<usize>,
    /// Entry thresholds to test
    pub entry_zs: Vec<f64>,
    /// Exit thresholds to test
    pub exit_zs: Vec<f64>,

    /// Minimum number of position changes for a result to count
    #[serde(default = "default_min_trades")]
    pub min_trades: usize,

    /// Minimum post-warmup rows for a result to count
    #[serde(default = "default_min_obs")]
    pub min_obs: usize,

    /// Evaluate combinations on the rayon pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

// Default value functions for serde
fn default_min_trades() -> usize {
    10
}
fn default_min_obs() -> usize {
    200
}
fn default_parallel() -> bool {
    true
}

impl Default for GridSearchConfig {
    fn default() -> Self {
        Self {
            lookbacks: (20..=100).step_by(10).collect(),
            entry_zs: vec![1.5, 2.0, 2.5, 3.0],
            exit_zs: vec![0.25, 0.5, 0.75, 1.0],
            min_trades: default_min_trades(),
            min_obs: default_min_obs(),
            parallel: default_parallel(),
        }
    }
}

impl GridSearchConfig {
    /// Grid with the default quality filters
    pub fn new(lookbacks: Vec<usize>, entry_zs: Vec<f64>, exit_zs: Vec<f64>) -> Self {
        Self {
            lookbacks,
            entry_zs,
            exit_zs,
            ..Default::default()
        }
    }

    pub fn with_filters(mut self, min_trades: usize, min_obs: usize) -> Self {
        self.min_trades = min_trades;
        self.min_obs = min_obs;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Parse from JSON and validate
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.lookbacks.is_empty() || self.entry_zs.is_empty() || self.exit_zs.is_empty() {
            return Err(PairsError::InvalidConfig(
                "lookbacks, entry_zs and exit_zs must all be non-empty".to_string(),
            ));
        }
        if self.lookbacks.contains(&0) {
            return Err(PairsError::InvalidConfig(
                "lookbacks must be at least 1".to_string(),
            ));
        }
        if let Some(z) = self
            .entry_zs
            .iter()
            .chain(&self.exit_zs)
            .find(|z| !z.is_finite() || **z < 0.0)
        {
            return Err(PairsError::InvalidConfig(format!(
                "z thresholds must be finite and non-negative, got {}",
                z
            )));
        }
        if self.combinations().next().is_none() {
            return Err(PairsError::InvalidConfig(
                "no combination has entry_z > exit_z".to_string(),
            ));
        }
        Ok(())
    }

    /// Size of the full Cartesian product, including skipped combinations
    pub fn grid_size(&self) -> usize {
        self.lookbacks.len() * self.entry_zs.len() * self.exit_zs.len()
    }

    /// Valid combinations in lookback, entry_z, exit_z nesting order.
    /// Combinations with `entry_z <= exit_z` are skipped.
    pub fn combinations(&self) -> impl Iterator<Item = ParameterConfig> + '_ {
        self.lookbacks.iter().flat_map(move |&lookback| {
            self.entry_zs.iter().flat_map(move |&entry_z| {
                self.exit_zs
                    .iter()
                    .filter(move |&&exit_z| entry_z > exit_z)
                    .map(move |&exit_z| ParameterConfig {
                        lookback,
                        entry_z,
                        exit_z,
                    })
            })
        })
    }
}

/// Maximum spread of each parameter across top configurations for the
/// region to count as stable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityTolerance {
    #[serde(default = "default_lookback_tolerance")]
    pub lookback: usize,
    #[serde(default = "default_entry_z_tolerance")]
    pub entry_z: f64,
    #[serde(default = "default_exit_z_tolerance")]
    pub exit_z: f64,
}

fn default_lookback_tolerance() -> usize {
    15
}
fn default_entry_z_tolerance() -> f64 {
    0.5
}
fn default_exit_z_tolerance() -> f64 {
    0.25
}

impl Default for StabilityTolerance {
    fn default() -> Self {
        Self {
            lookback: default_lookback_tolerance(),
            entry_z: default_entry_z_tolerance(),
            exit_z: default_exit_z_tolerance(),
        }
    }
}

/// Settings for [`run_analysis`](super::run_analysis)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Share of rows used for training in walk-forward validation
    #[serde(default = "default_train_fraction")]
    pub train_fraction: f64,

    /// Number of chronological segments for the robustness check
    #[serde(default = "default_n_periods")]
    pub n_periods: usize,

    /// Cost levels in basis points per side
    #[serde(default = "default_cost_bps_range")]
    pub cost_bps_range: Vec<f64>,

    /// Leading grid rows inspected for a stable region
    #[serde(default = "default_stability_top_n")]
    pub stability_top_n: usize,

    #[serde(default)]
    pub tolerance: StabilityTolerance,
}

fn default_train_fraction() -> f64 {
    0.7 // 70% train, 30% test
}
fn default_n_periods() -> usize {
    3
}
fn default_cost_bps_range() -> Vec<f64> {
    vec![0.0, 5.0, 10.0, 20.0, 50.0]
}
fn default_stability_top_n() -> usize {
    10
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            train_fraction: default_train_fraction(),
            n_periods: default_n_periods(),
            cost_bps_range: default_cost_bps_range(),
            stability_top_n: default_stability_top_n(),
            tolerance: StabilityTolerance::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse from JSON and validate
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(PairsError::InvalidConfig(format!(
                "train_fraction must be between 0 and 1 (exclusive), got {}",
                self.train_fraction
            )));
        }
        if self.n_periods < 2 {
            return Err(PairsError::InvalidConfig(format!(
                "n_periods must be at least 2, got {}",
                self.n_periods
            )));
        }
        if self.cost_bps_range.iter().any(|c| !c.is_finite() || *c < 0.0) {
            return Err(PairsError::InvalidConfig(
                "cost levels must be finite and non-negative".to_string(),
            ));
        }
        if self.stability_top_n == 0 {
            return Err(PairsError::InvalidConfig(
                "stability_top_n must be at least 1".to_string(),
            ));
        }
        let tol = &self.tolerance;
        if tol.entry_z < 0.0 || tol.exit_z < 0.0 {
            return Err(PairsError::InvalidConfig(
                "stability tolerances cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}
