//! Metrics Calculator
//!
//! Risk and performance statistics for one backtest. Degenerate inputs map to
//! fixed sentinels instead of errors:
//!
//! | Metric | Sentinel |
//! |---|---|
//! | sharpe_ratio | NaN when the pnl std is zero or undefined |
//! | sortino_ratio | NaN when the downside std is zero or undefined |
//! | win_rate | 0 when no day has non-zero pnl |
//! | avg_win / avg_loss | 0 when the subset is empty |
//! | profit_factor | +inf with gains and no losses, NaN with neither |

use crate::math::{mean, sample_std};
use crate::types::BacktestTable;
use serde::Serialize;
use std::fmt;

/// Trading days per year used to annualise daily ratios
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub num_trades: usize,
    pub turnover: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
}

impl PerformanceMetrics {
    /// Record for a backtest with no rows
    pub fn empty() -> Self {
        Self {
            total_return: 0.0,
            sharpe_ratio: f64::NAN,
            sortino_ratio: f64::NAN,
            max_drawdown: 0.0,
            win_rate: 0.0,
            num_trades: 0,
            turnover: 0.0,
            avg_win: 0.0,
            avg_loss: 0.0,
            profit_factor: f64::NAN,
        }
    }
}

impl fmt::Display for PerformanceMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total return:  {:.4}", self.total_return)?;
        writeln!(f, "Sharpe ratio:  {:.3}", self.sharpe_ratio)?;
        writeln!(f, "Sortino ratio: {:.3}", self.sortino_ratio)?;
        writeln!(f, "Max drawdown:  {:.4}", self.max_drawdown)?;
        writeln!(f, "Win rate:      {:.1}%", self.win_rate * 100.0)?;
        writeln!(f, "Trades:        {}", self.num_trades)?;
        writeln!(f, "Turnover:      {:.4}", self.turnover)?;
        writeln!(f, "Avg win/loss:  {:.5} / {:.5}", self.avg_win, self.avg_loss)?;
        write!(f, "Profit factor: {:.3}", self.profit_factor)
    }
}

/// Compute metrics for a backtest table
pub fn compute_metrics(bt: &BacktestTable) -> PerformanceMetrics {
    let signal: Vec<f64> = bt.signal().iter().map(|p| p.as_f64()).collect();
    metrics_from_series(bt.pnl(), bt.cum_pnl(), &signal)
}

/// Compute metrics from raw daily series.
///
/// `signal` is the held position per row (-1, 0, +1); all three series are
/// expected to share the same length.
pub fn metrics_from_series(pnl: &[f64], cum_pnl: &[f64], signal: &[f64]) -> PerformanceMetrics {
    if pnl.is_empty() {
        return PerformanceMetrics::empty();
    }

    let total_return = cum_pnl.last().copied().unwrap_or(0.0);

    let mean_pnl = mean(pnl);
    let annualise = TRADING_DAYS_PER_YEAR.sqrt();

    let std = sample_std(pnl);
    let sharpe_ratio = if std != 0.0 && !std.is_nan() {
        mean_pnl / std * annualise
    } else {
        f64::NAN
    };

    let wins: Vec<f64> = pnl.iter().copied().filter(|p| *p > 0.0).collect();
    let losses: Vec<f64> = pnl.iter().copied().filter(|p| *p < 0.0).collect();

    let downside_std = sample_std(&losses);
    let sortino_ratio = if downside_std != 0.0 && !downside_std.is_nan() {
        mean_pnl / downside_std * annualise
    } else {
        f64::NAN
    };

    let max_drawdown = max_drawdown(cum_pnl);

    let active = wins.len() + losses.len();
    let win_rate = if active > 0 {
        wins.len() as f64 / active as f64
    } else {
        0.0
    };

    let changes: Vec<f64> = signal.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    let num_trades = changes.iter().filter(|c| **c > 0.0).count();
    let turnover = if changes.is_empty() { 0.0 } else { mean(&changes) };

    let avg_win = if wins.is_empty() { 0.0 } else { mean(&wins) };
    let avg_loss = if losses.is_empty() { 0.0 } else { mean(&losses) };

    let gross_profit: f64 = wins.iter().sum();
    let gross_loss = losses.iter().sum::<f64>().abs();
    let profit_factor = if gross_loss != 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        f64::INFINITY
    } else {
        f64::NAN
    };

    PerformanceMetrics {
        total_return,
        sharpe_ratio,
        sortino_ratio,
        max_drawdown,
        win_rate,
        num_trades,
        turnover,
        avg_win,
        avg_loss,
        profit_factor,
    }
}

/// Largest peak-to-trough decline of a cumulative series (<= 0), 0 if empty
pub fn max_drawdown(cum_pnl: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst: f64 = 0.0;
    for &value in cum_pnl {
        peak = peak.max(value);
        worst = worst.min(value - peak);
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cumsum(pnl: &[f64]) -> Vec<f64> {
        pnl.iter()
            .scan(0.0, |acc, p| {
                *acc += p;
                Some(*acc)
            })
            .collect()
    }

    #[test]
    fn test_empty_series_gives_default_record() {
        let m = metrics_from_series(&[], &[], &[]);
        assert_eq!(m.total_return, 0.0);
        assert!(m.sharpe_ratio.is_nan());
        assert!(m.sortino_ratio.is_nan());
        assert_eq!(m.num_trades, 0);
        assert_eq!(m.turnover, 0.0);
        assert!(m.profit_factor.is_nan());
    }

    #[test]
    fn test_constant_pnl_has_undefined_sharpe() {
        let pnl = [0.01; 5];
        let m = metrics_from_series(&pnl, &cumsum(&pnl), &[1.0; 5]);
        assert!(m.sharpe_ratio.is_nan());
        assert!(m.sortino_ratio.is_nan());
        assert_eq!(m.profit_factor, f64::INFINITY);
        assert_eq!(m.win_rate, 1.0);
    }

    #[test]
    fn test_no_wins_no_losses() {
        let pnl = [0.0; 4];
        let m = metrics_from_series(&pnl, &cumsum(&pnl), &[0.0; 4]);
        assert!(m.profit_factor.is_nan());
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.avg_win, 0.0);
        assert_eq!(m.avg_loss, 0.0);
    }

    #[test]
    fn test_known_values() {
        let pnl = [0.0, 0.02, -0.01, 0.03, -0.02];
        let cum = cumsum(&pnl);
        let signal = [0.0, 1.0, 1.0, -1.0, 0.0];
        let m = metrics_from_series(&pnl, &cum, &signal);

        assert!((m.total_return - 0.02).abs() < 1e-12);
        assert_eq!(m.num_trades, 3);
        // |diffs| = 1, 0, 2, 1
        assert!((m.turnover - 1.0).abs() < 1e-12);
        assert!((m.win_rate - 0.5).abs() < 1e-12);
        assert!((m.avg_win - 0.025).abs() < 1e-12);
        assert!((m.avg_loss + 0.015).abs() < 1e-12);
        assert!((m.profit_factor - 0.05 / 0.03).abs() < 1e-9);
        // peak 0.04 at row 3, trough 0.02 at row 4
        assert!((m.max_drawdown + 0.02).abs() < 1e-12);

        let expected_sharpe = mean(&pnl) / sample_std(&pnl) * 252f64.sqrt();
        assert!((m.sharpe_ratio - expected_sharpe).abs() < 1e-9);
        let expected_sortino = mean(&pnl) / sample_std(&[-0.01, -0.02]) * 252f64.sqrt();
        assert!((m.sortino_ratio - expected_sortino).abs() < 1e-9);
    }

    #[test]
    fn test_single_loss_has_undefined_sortino() {
        let pnl = [0.0, 0.01, -0.005, 0.02];
        let m = metrics_from_series(&pnl, &cumsum(&pnl), &[1.0; 4]);
        assert!(m.sortino_ratio.is_nan());
        assert!(m.sharpe_ratio.is_finite());
    }

    #[test]
    fn test_single_row_turnover_is_zero() {
        let m = metrics_from_series(&[0.0], &[0.0], &[1.0]);
        assert_eq!(m.turnover, 0.0);
        assert!(m.sharpe_ratio.is_nan());
    }

    #[test]
    fn test_max_drawdown_never_positive() {
        assert_eq!(max_drawdown(&[0.0, 0.1, 0.2]), 0.0);
        assert!((max_drawdown(&[0.0, 0.3, -0.1, 0.2]) + 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_display_lists_every_metric() {
        let text = PerformanceMetrics::empty().to_string();
        for label in ["Sharpe", "Sortino", "drawdown", "Win rate", "Trades", "Profit factor"] {
            assert!(text.contains(label), "missing {}", label);
        }
    }
}
