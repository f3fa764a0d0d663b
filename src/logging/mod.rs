//! Logging Module
//!
//! Progress reporting for long parameter sweeps:
//! - `SweepProgress` trait - Observer fed by the grid search
//! - `TracingProgress` - Rate-limited structured progress logs

pub mod progress;

pub use progress::{NoProgress, SweepProgress, TracingProgress};
