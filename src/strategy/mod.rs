//! Signal Engine
//!
//! Mean-reversion state machine over the spread z-score. A stretched spread
//! sets the side betting on reversion. Rows inside the exit band are flat,
//! and the last entry side is held on every other row.

use crate::error::{PairsError, Result};
use crate::types::{Position, SignalTable, SpreadTable};

/// Entry and exit bands, validated so that `entry_z > exit_z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    entry_z: f64,
    exit_z: f64,
}

impl Thresholds {
    /// # Errors
    /// `InvalidThreshold` unless `entry_z > exit_z` (NaN never qualifies).
    pub fn new(entry_z: f64, exit_z: f64) -> Result<Self> {
        if !(entry_z > exit_z) {
            return Err(PairsError::InvalidThreshold { entry_z, exit_z });
        }
        Ok(Self { entry_z, exit_z })
    }

    pub fn entry_z(&self) -> f64 {
        self.entry_z
    }

    pub fn exit_z(&self) -> f64 {
        self.exit_z
    }

    /// Position requested by a single z-score, ignoring any held state
    pub fn raw_entry(&self, z: f64) -> Option<Position> {
        if z > self.entry_z {
            Some(Position::Short)
        } else if z < -self.entry_z {
            Some(Position::Long)
        } else {
            None
        }
    }

    pub fn is_exit(&self, z: f64) -> bool {
        z.abs() <= self.exit_z
    }
}

/// Three-state position machine (Flat, Long, Short), starting Flat.
///
/// The machine remembers the side of the most recent entry breach. Each row
/// emits that side, except rows inside the exit band, which emit Flat without
/// forgetting it: once |z| leaves the exit band again the remembered side is
/// held again. A NaN z-score neither enters nor exits.
///
/// Row by row this equals forward-filling the raw entry signal and then
/// zeroing the exit rows.
#[derive(Debug, Clone, Copy)]
pub struct SignalState {
    thresholds: Thresholds,
    /// Side of the last entry breach, Flat before the first one
    carried: Position,
    position: Position,
}

impl SignalState {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            carried: Position::Flat,
            position: Position::Flat,
        }
    }

    /// Position emitted on the last row
    pub fn position(&self) -> Position {
        self.position
    }

    /// Side that will be held on the next row outside the exit band
    pub fn carried(&self) -> Position {
        self.carried
    }

    /// Advance by one row and return the position held on that row
    pub fn step(&mut self, z: f64) -> Position {
        if let Some(entry) = self.thresholds.raw_entry(z) {
            self.carried = entry;
        }
        self.position = if self.thresholds.is_exit(z) {
            Position::Flat
        } else {
            self.carried
        };
        self.position
    }
}

/// Run the state machine over a z-score series.
///
/// # Errors
/// `InvalidThreshold` unless `entry_z > exit_z`.
pub fn positions_from_zscores(zscores: &[f64], entry_z: f64, exit_z: f64) -> Result<Vec<Position>> {
    let mut state = SignalState::new(Thresholds::new(entry_z, exit_z)?);
    Ok(zscores.iter().map(|&z| state.step(z)).collect())
}

/// Attach a position column to a spread table.
///
/// # Errors
/// `InvalidThreshold` unless `entry_z > exit_z`.
pub fn generate_signals(spread: &SpreadTable, entry_z: f64, exit_z: f64) -> Result<SignalTable> {
    let signal = positions_from_zscores(spread.zscore(), entry_z, exit_z)?;
    Ok(SignalTable {
        spread: spread.clone(),
        entry_z,
        exit_z,
        signal,
    })
}
