//! Transaction cost sensitivity
//!
//! Charges a round-trip cost per trade against the zero-cost grid and reports
//! which configuration ranks first at each cost level. The adjustment scales
//! the baseline Sharpe by `adjusted_return / total_return` instead of
//! re-simulating daily pnl net of costs.

use super::config::{GridSearchConfig, ParameterConfig};
use super::grid::{cmp_desc_nan_last, grid_search, GridSearchResult, GridSearchRow};
use crate::types::PriceTable;
use serde::Serialize;
use tracing::{info, warn};

/// Basis points per unit
const BPS: f64 = 10_000.0;

/// Top configuration at one cost level
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostRow {
    pub cost_bps: f64,
    #[serde(flatten)]
    pub params: ParameterConfig,
    pub num_trades: usize,
    /// Zero-cost total return
    pub gross_return: f64,
    /// `num_trades * 2 * cost_bps / 10_000`
    pub cost_drag: f64,
    pub adjusted_return: f64,
    /// Zero-cost Sharpe
    pub gross_sharpe: f64,
    pub adjusted_sharpe: f64,
}

impl CostRow {
    /// Apply `cost_bps` to a zero-cost grid row
    pub fn from_baseline(row: &GridSearchRow, cost_bps: f64) -> Self {
        let m = row.metrics();
        let cost_drag = m.num_trades as f64 * 2.0 * (cost_bps / BPS);
        let adjusted_return = m.total_return - cost_drag;
        let adjusted_sharpe = if m.total_return != 0.0 {
            m.sharpe_ratio * (adjusted_return / m.total_return)
        } else {
            0.0
        };
        Self {
            cost_bps,
            params: row.params(),
            num_trades: m.num_trades,
            gross_return: m.total_return,
            cost_drag,
            adjusted_return,
            gross_sharpe: m.sharpe_ratio,
            adjusted_sharpe,
        }
    }
}

/// Best configuration per cost level, ranked by adjusted Sharpe then
/// adjusted return (NaN last). Returns one row per level, in input order.
pub fn transaction_cost_analysis(
    prices: &PriceTable,
    cfg: &GridSearchConfig,
    cost_bps_range: &[f64],
) -> Vec<CostRow> {
    info!(levels = cost_bps_range.len(), "Running transaction cost analysis");
    cost_sensitivity(&grid_search(prices, cfg), cost_bps_range)
}

/// Cost levels applied to an existing zero-cost grid
pub fn cost_sensitivity(baseline: &GridSearchResult, cost_bps_range: &[f64]) -> Vec<CostRow> {
    if baseline.is_empty() {
        warn!("No baseline configurations for cost analysis");
        return Vec::new();
    }

    cost_bps_range
        .iter()
        .filter_map(|&cost_bps| {
            baseline
                .iter()
                .map(|row| CostRow::from_baseline(row, cost_bps))
                .min_by(|x, y| {
                    cmp_desc_nan_last(x.adjusted_sharpe, y.adjusted_sharpe)
                        .then_with(|| cmp_desc_nan_last(x.adjusted_return, y.adjusted_return))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::PerformanceMetrics;
    use crate::optimize::grid::RunRecord;

    fn baseline_row(total_return: f64, sharpe: f64, num_trades: usize) -> GridSearchRow {
        let mut metrics = PerformanceMetrics::empty();
        metrics.total_return = total_return;
        metrics.sharpe_ratio = sharpe;
        metrics.num_trades = num_trades;
        GridSearchRow::from_run(RunRecord {
            params: ParameterConfig {
                lookback: 60,
                entry_z: 2.0,
                exit_z: 0.5,
            },
            observations: 400,
            metrics,
        })
    }

    #[test]
    fn test_cost_adjustment() {
        let row = CostRow::from_baseline(&baseline_row(0.5, 1.2, 25), 10.0);
        assert!((row.cost_drag - 0.05).abs() < 1e-12);
        assert!((row.adjusted_return - 0.45).abs() < 1e-12);
        assert!((row.adjusted_sharpe - 1.2 * 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_zero_cost_keeps_baseline() {
        let row = CostRow::from_baseline(&baseline_row(0.3, 0.8, 12), 0.0);
        assert_eq!(row.cost_drag, 0.0);
        assert_eq!(row.adjusted_return, 0.3);
        assert_eq!(row.adjusted_sharpe, 0.8);
    }

    #[test]
    fn test_zero_return_gives_zero_adjusted_sharpe() {
        let row = CostRow::from_baseline(&baseline_row(0.0, 1.0, 12), 5.0);
        assert_eq!(row.adjusted_sharpe, 0.0);
        assert!(row.adjusted_return < 0.0);
    }

    #[test]
    fn test_higher_costs_favour_fewer_trades() {
        let baseline = GridSearchResult::from_rows(vec![
            baseline_row(0.20, 1.5, 60),
            baseline_row(0.15, 1.2, 10),
        ]);
        let rows = cost_sensitivity(&baseline, &[0.0, 20.0]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].num_trades, 60);
        // 60 trades at 20 bps wipe out the return, 10 trades do not
        assert_eq!(rows[1].num_trades, 10);
        assert_eq!(rows[1].cost_bps, 20.0);
    }

    #[test]
    fn test_empty_prices_give_no_rows() {
        let prices = PriceTable::empty(("A", "B"));
        let rows = transaction_cost_analysis(&prices, &GridSearchConfig::default(), &[0.0, 10.0]);
        assert!(rows.is_empty());
    }
}
