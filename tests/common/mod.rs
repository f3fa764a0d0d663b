//! Shared fixtures for integration tests

#![allow(dead_code)]

use chrono::NaiveDate;
use pairs_optimizer::PriceTable;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Consecutive calendar dates starting 2020-01-01
pub fn dates(n: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    (0..n).map(|i| start + chrono::Duration::days(i as i64)).collect()
}

pub fn table(a: Vec<f64>, b: Vec<f64>) -> PriceTable {
    PriceTable::new(("A", "B"), dates(a.len()), a, b).unwrap()
}

/// Cointegrated pair: B is a random walk, A = 1.5 B + 20 + AR(1) noise.
///
/// The intercept keeps the spread well away from zero so spread returns
/// stay small.
pub fn cointegrated_prices(n: usize, seed: u64) -> PriceTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let walk = Normal::new(0.0, 0.5).unwrap();
    let noise = Normal::new(0.0, 0.8).unwrap();

    let mut b = 100.0;
    let mut deviation = 0.0;
    let mut asset_a = Vec::with_capacity(n);
    let mut asset_b = Vec::with_capacity(n);
    for _ in 0..n {
        b = f64::max(b + walk.sample(&mut rng), 10.0);
        deviation = 0.85 * deviation + noise.sample(&mut rng);
        asset_a.push(1.5 * b + 20.0 + deviation);
        asset_b.push(b);
    }
    PriceTable::new(("AAA", "BBB"), dates(n), asset_a, asset_b).unwrap()
}

/// Install a test subscriber once; honours RUST_LOG
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
