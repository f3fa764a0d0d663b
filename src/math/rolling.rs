//! Sample statistics and fixed-window rolling statistics.
//!
//! All dispersion measures use the sample (n - 1) denominator. A window whose
//! values are all identical has a variance of exactly zero, so a flat spread
//! never produces a spurious non-zero deviation from floating-point rounding.
//!
//! Rolling outputs come from polars fixed-window kernels and are aligned with
//! their input: the first `window - 1` entries are NaN (undefined) and entry
//! `t` summarises `values[t+1-window..=t]`.

use crate::error::Result;
use polars::prelude::*;

/// True when every value equals the first one
fn is_constant(values: &[f64]) -> bool {
    match values.first() {
        Some(first) => values.iter().all(|v| v == first),
        None => true,
    }
}

/// Arithmetic mean, NaN for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    if is_constant(values) {
        return values[0];
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance, NaN for fewer than two values
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    if is_constant(values) {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Sample standard deviation, NaN for fewer than two values
pub fn sample_std(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

/// Sample covariance of two equally sized slices, NaN for fewer than two pairs
pub fn sample_covariance(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return f64::NAN;
    }
    if is_constant(a) || is_constant(b) {
        return 0.0;
    }
    let mean_a = mean(a);
    let mean_b = mean(b);
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>()
        / (a.len() - 1) as f64
}

/// Median; the mean of the two middle values for an even count. NaN if empty.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|x, y| x.total_cmp(y));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn fixed_window(window: usize) -> RollingOptionsFixedWindow {
    RollingOptionsFixedWindow {
        window_size: window,
        min_periods: window,
        weights: None,
        center: false,
        fn_params: None,
    }
}

/// Series values as f64, nulls become NaN
fn values_of(series: &Series) -> Result<Vec<f64>> {
    Ok(series
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Windows whose minimum equals their maximum; their statistics are pinned
/// to exact values.
fn constant_windows(series: &Series, window: usize) -> Result<Vec<bool>> {
    let lo = values_of(&series.rolling_min(fixed_window(window))?)?;
    let hi = values_of(&series.rolling_max(fixed_window(window))?)?;
    Ok(lo.iter().zip(&hi).map(|(l, h)| l == h).collect())
}

fn undefined(len: usize) -> Vec<f64> {
    vec![f64::NAN; len]
}

pub fn rolling_mean(values: &[f64], window: usize) -> Result<Vec<f64>> {
    if window == 0 || window > values.len() {
        return Ok(undefined(values.len()));
    }
    let series = Series::new("values", values);
    let means = values_of(&series.rolling_mean(fixed_window(window))?)?;
    let flat = constant_windows(&series, window)?;
    Ok(means
        .into_iter()
        .zip(flat)
        .zip(values)
        .map(|((m, flat), v)| if flat { *v } else { m })
        .collect())
}

/// Rolling sample (ddof = 1) dispersion; `sqrt` picks std over variance
fn rolling_dispersion(values: &[f64], window: usize, sqrt: bool) -> Result<Vec<f64>> {
    if window < 2 || window > values.len() {
        return Ok(undefined(values.len()));
    }
    let series = Series::new("values", values);
    let opts = fixed_window(window);
    let raw = if sqrt {
        series.rolling_std(opts)?
    } else {
        series.rolling_var(opts)?
    };
    let flat = constant_windows(&series, window)?;
    Ok(values_of(&raw)?
        .into_iter()
        .zip(flat)
        .map(|(d, flat)| if flat { 0.0 } else { d.max(0.0) })
        .collect())
}

pub fn rolling_variance(values: &[f64], window: usize) -> Result<Vec<f64>> {
    rolling_dispersion(values, window, false)
}

pub fn rolling_std(values: &[f64], window: usize) -> Result<Vec<f64>> {
    rolling_dispersion(values, window, true)
}

/// Rolling sample covariance, `(E[ab] - E[a]E[b]) * w / (w - 1)` per window.
/// Slices of different length are truncated to the shorter.
pub fn rolling_covariance(a: &[f64], b: &[f64], window: usize) -> Result<Vec<f64>> {
    let len = a.len().min(b.len());
    if window < 2 || window > len {
        return Ok(undefined(len));
    }
    let (a, b) = (&a[..len], &b[..len]);
    let product: Vec<f64> = a.iter().zip(b).map(|(x, y)| x * y).collect();

    let mean_ab = rolling_mean(&product, window)?;
    let mean_a = rolling_mean(a, window)?;
    let mean_b = rolling_mean(b, window)?;
    let flat_a = constant_windows(&Series::new("a", a), window)?;
    let flat_b = constant_windows(&Series::new("b", b), window)?;

    let scale = window as f64 / (window - 1) as f64;
    Ok((0..len)
        .map(|t| {
            if flat_a[t] || flat_b[t] {
                0.0
            } else {
                (mean_ab[t] - mean_a[t] * mean_b[t]) * scale
            }
        })
        .collect())
}
