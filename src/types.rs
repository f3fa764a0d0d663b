//! Common Types Module
//!
//! Typed tables flowing through the pipeline. Each stage borrows the previous
//! table and returns a new owned one that carries every upstream column:
//!
//! ```text
//! PriceTable -> SpreadTable -> SignalTable -> BacktestTable
//! ```

use crate::error::{PairsError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Position held in the spread.
///
/// Long spread buys asset A and sells asset B; short spread is the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Position {
    Short,
    #[default]
    Flat,
    Long,
}

impl Position {
    /// Signed representation: -1, 0 or +1
    pub fn as_i8(self) -> i8 {
        match self {
            Position::Short => -1,
            Position::Flat => 0,
            Position::Long => 1,
        }
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.as_i8())
    }

    pub fn is_flat(self) -> bool {
        self == Position::Flat
    }
}

impl From<Position> for i8 {
    fn from(position: Position) -> Self {
        position.as_i8()
    }
}

impl TryFrom<i8> for Position {
    type Error = String;

    fn try_from(value: i8) -> std::result::Result<Self, Self::Error> {
        match value {
            -1 => Ok(Position::Short),
            0 => Ok(Position::Flat),
            1 => Ok(Position::Long),
            other => Err(format!("signal must be -1, 0 or +1, got {}", other)),
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Short => write!(f, "short"),
            Position::Flat => write!(f, "flat"),
            Position::Long => write!(f, "long"),
        }
    }
}

/// Two aligned daily price series indexed by date.
///
/// Invariants (enforced by [`PriceTable::new`]): equal column lengths,
/// strictly increasing dates, finite prices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTable {
    pub(crate) names: [String; 2],
    pub(crate) index: Vec<NaiveDate>,
    pub(crate) asset_a: Vec<f64>,
    pub(crate) asset_b: Vec<f64>,
}

impl PriceTable {
    /// Build a validated price table.
    ///
    /// # Errors
    /// - `InvalidShape` if the three columns differ in length
    /// - `UnsortedIndex` if dates are not strictly increasing
    /// - `NonFinitePrice` if any price is NaN or infinite
    pub fn new(
        names: (impl Into<String>, impl Into<String>),
        index: Vec<NaiveDate>,
        asset_a: Vec<f64>,
        asset_b: Vec<f64>,
    ) -> Result<Self> {
        let names = [names.0.into(), names.1.into()];

        if asset_a.len() != index.len() || asset_b.len() != index.len() {
            return Err(PairsError::InvalidShape(format!(
                "expected two price columns of length {}, got {} and {}",
                index.len(),
                asset_a.len(),
                asset_b.len()
            )));
        }

        if let Some(row) = index.windows(2).position(|w| w[1] <= w[0]) {
            return Err(PairsError::UnsortedIndex { row: row + 1 });
        }

        for (column, values) in names.iter().zip([&asset_a, &asset_b]) {
            if let Some(row) = values.iter().position(|p| !p.is_finite()) {
                return Err(PairsError::NonFinitePrice {
                    column: column.clone(),
                    row,
                });
            }
        }

        Ok(Self {
            names,
            index,
            asset_a,
            asset_b,
        })
    }

    /// An empty table with the given column names
    pub fn empty(names: (impl Into<String>, impl Into<String>)) -> Self {
        Self {
            names: [names.0.into(), names.1.into()],
            index: Vec::new(),
            asset_a: Vec::new(),
            asset_b: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn names(&self) -> (&str, &str) {
        (&self.names[0], &self.names[1])
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn asset_a(&self) -> &[f64] {
        &self.asset_a
    }

    pub fn asset_b(&self) -> &[f64] {
        &self.asset_b
    }

    /// First and last date, if any
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.index.first()?, *self.index.last()?))
    }

    /// Owned contiguous sub-table by row position. Out-of-bounds ends are clamped.
    pub fn slice(&self, rows: Range<usize>) -> PriceTable {
        let end = rows.end.min(self.len());
        let start = rows.start.min(end);
        PriceTable {
            names: self.names.clone(),
            index: self.index[start..end].to_vec(),
            asset_a: self.asset_a[start..end].to_vec(),
            asset_b: self.asset_b[start..end].to_vec(),
        }
    }
}

/// Price table augmented with hedge ratio, spread and rolling z-score.
///
/// Warmup rows are already dropped, so every column is defined and
/// `zscore` is finite on every row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadTable {
    pub(crate) prices: PriceTable,
    pub(crate) lookback: usize,
    pub(crate) beta: Vec<f64>,
    pub(crate) spread: Vec<f64>,
    pub(crate) spread_mean: Vec<f64>,
    pub(crate) spread_std: Vec<f64>,
    pub(crate) zscore: Vec<f64>,
}

impl SpreadTable {
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Post-warmup prices
    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    pub fn index(&self) -> &[NaiveDate] {
        self.prices.index()
    }

    /// Rolling window the table was built with
    pub fn lookback(&self) -> usize {
        self.lookback
    }

    pub fn beta(&self) -> &[f64] {
        &self.beta
    }

    pub fn spread(&self) -> &[f64] {
        &self.spread
    }

    pub fn spread_mean(&self) -> &[f64] {
        &self.spread_mean
    }

    pub fn spread_std(&self) -> &[f64] {
        &self.spread_std
    }

    pub fn zscore(&self) -> &[f64] {
        &self.zscore
    }
}

/// Spread table with the position held on each row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalTable {
    pub(crate) spread: SpreadTable,
    pub(crate) entry_z: f64,
    pub(crate) exit_z: f64,
    pub(crate) signal: Vec<Position>,
}

impl SignalTable {
    pub fn len(&self) -> usize {
        self.signal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signal.is_empty()
    }

    pub fn spread_table(&self) -> &SpreadTable {
        &self.spread
    }

    pub fn index(&self) -> &[NaiveDate] {
        self.spread.index()
    }

    pub fn entry_z(&self) -> f64 {
        self.entry_z
    }

    pub fn exit_z(&self) -> f64 {
        self.exit_z
    }

    pub fn signal(&self) -> &[Position] {
        &self.signal
    }
}

/// Signal table with daily and cumulative PnL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestTable {
    pub(crate) signals: SignalTable,
    pub(crate) spread_ret: Vec<f64>,
    pub(crate) pnl: Vec<f64>,
    pub(crate) cum_pnl: Vec<f64>,
}

impl BacktestTable {
    pub fn len(&self) -> usize {
        self.pnl.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pnl.is_empty()
    }

    pub fn signal_table(&self) -> &SignalTable {
        &self.signals
    }

    pub fn index(&self) -> &[NaiveDate] {
        self.signals.index()
    }

    pub fn signal(&self) -> &[Position] {
        self.signals.signal()
    }

    pub fn spread_ret(&self) -> &[f64] {
        &self.spread_ret
    }

    pub fn pnl(&self) -> &[f64] {
        &self.pnl
    }

    pub fn cum_pnl(&self) -> &[f64] {
        &self.cum_pnl
    }
}
