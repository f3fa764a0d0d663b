//! Mathematical utilities for the pairs pipeline.
//!
//! Sample statistics (ddof = 1) for the metrics calculator and polars-backed
//! fixed-window rolling versions for the spread builder.

pub mod rolling;

pub use rolling::{
    mean, median, rolling_covariance, rolling_mean, rolling_std, rolling_variance,
    sample_covariance, sample_std, sample_variance,
};
