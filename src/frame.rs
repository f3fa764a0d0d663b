//! Polars DataFrame interop
//!
//! The pipeline runs on typed tables; this module converts them to and from
//! `DataFrame`s and offers frame-level versions of each stage for callers that
//! keep their data in polars. Column lookups surface `MissingColumn`, the
//! price frame shape check surfaces `InvalidShape` and signal cells outside
//! -1/0/+1 surface `InvalidSignal`.

use crate::backtest::simulate;
use crate::error::{PairsError, Result};
use crate::metrics::{metrics_from_series, PerformanceMetrics};
use crate::spread::build_spread;
use crate::strategy::positions_from_zscores;
use crate::types::{BacktestTable, Position, PriceTable, SignalTable, SpreadTable};
use chrono::NaiveDate;
use polars::prelude::*;
use tracing::debug;

/// Name of the date column in exported frames
pub const DATE_COLUMN: &str = "date";

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map_err(|_| PairsError::MissingColumn(name.to_string()))
}

/// Numeric column as f64, nulls become NaN
pub(crate) fn f64_values(series: &Series) -> Result<Vec<f64>> {
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Signal column as positions, nulls become Flat
fn positions(series: &Series) -> Result<Vec<Position>> {
    f64_values(series)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            if value.is_nan() || value == 0.0 {
                Ok(Position::Flat)
            } else if value == 1.0 {
                Ok(Position::Long)
            } else if value == -1.0 {
                Ok(Position::Short)
            } else {
                Err(PairsError::InvalidSignal { row, value })
            }
        })
        .collect()
}

fn date_series(index: &[NaiveDate]) -> Series {
    DateChunked::from_naive_date(DATE_COLUMN, index.iter().copied()).into_series()
}

fn signal_series(signal: &[Position]) -> Series {
    let values: Vec<i32> = signal.iter().map(|p| i32::from(p.as_i8())).collect();
    Series::new("signal", values)
}

impl PriceTable {
    /// Build a price table from a frame holding a date column and exactly
    /// two numeric price columns.
    ///
    /// Rows with a null date or a missing price are dropped.
    ///
    /// # Errors
    /// - `MissingColumn` if `date_column` is absent
    /// - `InvalidShape` unless exactly two other columns are present
    /// - `UnsortedIndex` / `NonFinitePrice` from [`PriceTable::new`]
    pub fn from_dataframe(df: &DataFrame, date_column: &str) -> Result<Self> {
        let dates = column(df, date_column)?.cast(&DataType::Date)?;
        let price_columns: Vec<&Series> = df
            .get_columns()
            .iter()
            .filter(|s| s.name() != date_column)
            .collect();

        if price_columns.len() != 2 {
            return Err(PairsError::InvalidShape(format!(
                "expected exactly two price columns besides '{}', found {}",
                date_column,
                price_columns.len()
            )));
        }

        let a = f64_values(price_columns[0])?;
        let b = f64_values(price_columns[1])?;

        let mut index = Vec::with_capacity(a.len());
        let mut asset_a = Vec::with_capacity(a.len());
        let mut asset_b = Vec::with_capacity(b.len());
        let mut dropped = 0usize;

        for ((date, pa), pb) in dates.date()?.as_date_iter().zip(a).zip(b) {
            match date {
                Some(date) if !pa.is_nan() && !pb.is_nan() => {
                    index.push(date);
                    asset_a.push(pa);
                    asset_b.push(pb);
                }
                _ => dropped += 1,
            }
        }

        if dropped > 0 {
            debug!(dropped, "Dropped rows with missing values");
        }

        PriceTable::new(
            (price_columns[0].name(), price_columns[1].name()),
            index,
            asset_a,
            asset_b,
        )
    }

    fn series(&self) -> Vec<Series> {
        vec![
            date_series(&self.index),
            Series::new(self.names[0].as_str(), self.asset_a.as_slice()),
            Series::new(self.names[1].as_str(), self.asset_b.as_slice()),
        ]
    }

    pub fn to_dataframe(&self) -> Result<DataFrame> {
        Ok(DataFrame::new(self.series())?)
    }
}

impl SpreadTable {
    fn series(&self) -> Vec<Series> {
        let mut columns = self.prices.series();
        columns.push(Series::new("beta", self.beta.as_slice()));
        columns.push(Series::new("spread", self.spread.as_slice()));
        columns.push(Series::new("spread_mean", self.spread_mean.as_slice()));
        columns.push(Series::new("spread_std", self.spread_std.as_slice()));
        columns.push(Series::new("zscore", self.zscore.as_slice()));
        columns
    }

    /// Columns: date, both assets, beta, spread, spread_mean, spread_std, zscore
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        Ok(DataFrame::new(self.series())?)
    }
}

impl SignalTable {
    fn series(&self) -> Vec<Series> {
        let mut columns = self.spread.series();
        columns.push(signal_series(&self.signal));
        columns
    }

    /// Spread columns plus `signal` (-1, 0, +1)
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        Ok(DataFrame::new(self.series())?)
    }
}

impl BacktestTable {
    /// Signal columns plus spread_ret, pnl, cum_pnl
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = self.signals.series();
        columns.push(Series::new("spread_ret", self.spread_ret.as_slice()));
        columns.push(Series::new("pnl", self.pnl.as_slice()));
        columns.push(Series::new("cum_pnl", self.cum_pnl.as_slice()));
        Ok(DataFrame::new(columns)?)
    }
}

/// Spread Builder over a price frame; see [`build_spread`]
pub fn spread_from_frame(df: &DataFrame, date_column: &str, lookback: usize) -> Result<DataFrame> {
    let prices = PriceTable::from_dataframe(df, date_column)?;
    build_spread(&prices, lookback)?.to_dataframe()
}

/// Adds a `signal` column derived from `zscore`.
///
/// # Errors
/// `MissingColumn("zscore")`, or `InvalidThreshold` unless `entry_z > exit_z`.
pub fn signals_from_frame(df: &DataFrame, entry_z: f64, exit_z: f64) -> Result<DataFrame> {
    let zscore = f64_values(column(df, "zscore")?)?;
    let signal = positions_from_zscores(&zscore, entry_z, exit_z)?;
    let mut out = df.clone();
    out.with_column(signal_series(&signal))?;
    Ok(out)
}

/// Adds spread_ret, pnl and cum_pnl computed from `spread` and `signal`.
///
/// # Errors
/// `MissingColumn` if either input column is absent, `InvalidSignal` for a
/// signal cell outside -1/0/+1.
pub fn backtest_from_frame(df: &DataFrame) -> Result<DataFrame> {
    let spread = column(df, "spread")?;
    let signal = column(df, "signal")?;
    let sim = simulate(&f64_values(spread)?, &positions(signal)?);

    let mut out = df.clone();
    out.with_column(Series::new("spread_ret", sim.spread_ret))?;
    out.with_column(Series::new("pnl", sim.pnl))?;
    out.with_column(Series::new("cum_pnl", sim.cum_pnl))?;
    Ok(out)
}

/// Metrics from a frame holding `pnl`, `cum_pnl` and `signal`.
///
/// # Errors
/// `MissingColumn` if any of the three is absent.
pub fn metrics_from_frame(df: &DataFrame) -> Result<PerformanceMetrics> {
    let pnl = f64_values(column(df, "pnl")?)?;
    let cum_pnl = f64_values(column(df, "cum_pnl")?)?;
    let signal: Vec<f64> = positions(column(df, "signal")?)?
        .into_iter()
        .map(Position::as_f64)
        .collect();
    Ok(metrics_from_series(&pnl, &cum_pnl, &signal))
}
