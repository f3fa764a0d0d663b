//! Backtest Simulator
//!
//! Applies yesterday's position to today's spread return. The one-row lag is
//! the only thing standing between the signal and lookahead bias, so the
//! first row never carries a position.

use crate::types::{BacktestTable, Position, SignalTable};

/// Daily series produced by [`simulate`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Simulation {
    pub spread_ret: Vec<f64>,
    pub pnl: Vec<f64>,
    pub cum_pnl: Vec<f64>,
}

/// Percentage change of the spread, 0 where no prior value exists or the
/// ratio is undefined (zero or non-finite prior value).
pub fn spread_returns(spread: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(spread.len());
    if spread.is_empty() {
        return out;
    }
    out.push(0.0);
    for w in spread.windows(2) {
        let ret = (w[1] - w[0]) / w[0];
        out.push(if ret.is_finite() { ret } else { 0.0 });
    }
    out
}

/// Simulate lagged positions over a spread series.
///
/// Slices are paired row by row; a length mismatch truncates to the shorter.
pub fn simulate(spread: &[f64], signal: &[Position]) -> Simulation {
    let len = spread.len().min(signal.len());
    let spread_ret = spread_returns(&spread[..len]);

    let pnl: Vec<f64> = spread_ret
        .iter()
        .enumerate()
        .map(|(t, ret)| {
            let held = if t == 0 { Position::Flat } else { signal[t - 1] };
            held.as_f64() * ret
        })
        .collect();

    let cum_pnl = pnl
        .iter()
        .scan(0.0, |acc, p| {
            *acc += p;
            Some(*acc)
        })
        .collect();

    Simulation {
        spread_ret,
        pnl,
        cum_pnl,
    }
}

/// Attach spread_ret, pnl and cum_pnl to a signal table
pub fn run_backtest(signalled: &SignalTable) -> BacktestTable {
    let sim = simulate(signalled.spread_table().spread(), signalled.signal());
    BacktestTable {
        signals: signalled.clone(),
        spread_ret: sim.spread_ret,
        pnl: sim.pnl,
        cum_pnl: sim.cum_pnl,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Position::{Flat, Long, Short};

    #[test]
    fn test_long_position_on_rising_then_falling_spread() {
        let sim = simulate(&[100.0, 110.0, 105.0], &[Long, Long, Long]);
        assert_eq!(sim.pnl[0], 0.0);
        assert!((sim.pnl[1] - 0.10).abs() < 1e-12);
        assert!((sim.pnl[2] - (105.0 / 110.0 - 1.0)).abs() < 1e-12);
        assert!((sim.cum_pnl[2] - (0.10 + 105.0 / 110.0 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_same_day_signal_is_not_used() {
        // the jump on row 1 happens on the row the short is entered
        let sim = simulate(&[10.0, 20.0, 20.0], &[Flat, Short, Short]);
        assert_eq!(sim.pnl, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_zero_prior_spread_gives_zero_return() {
        let ret = spread_returns(&[0.0, 1.0, 2.0]);
        assert_eq!(ret, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_short_profits_from_falling_spread() {
        let sim = simulate(&[4.0, 4.0, 2.0], &[Short, Short, Flat]);
        assert!((sim.pnl[2] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_series() {
        let sim = simulate(&[], &[]);
        assert_eq!(sim, Simulation::default());
    }

    #[test]
    fn test_cum_pnl_is_prefix_sum() {
        let sim = simulate(&[1.0, 1.2, 0.9, 1.1, 1.3], &[Long, Short, Long, Long, Flat]);
        let mut acc = 0.0;
        for (p, c) in sim.pnl.iter().zip(&sim.cum_pnl) {
            acc += p;
            assert!((acc - c).abs() < 1e-12);
        }
    }
}
