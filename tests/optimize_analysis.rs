//! Grid search and the analyses built on top of it

mod common;

use common::{cointegrated_prices, init_tracing, table};
use pairs_optimizer::optimize::{
    best_config, grid_search, grid_search_with_progress, identify_stable_regions, robustness_analysis,
    run_analysis, single_run, transaction_cost_analysis, walk_forward_validation, AnalysisConfig,
    GridSearchConfig, GridSearchResult, StabilityTolerance, Verdict,
};
use pairs_optimizer::PairsError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

fn wide_grid() -> GridSearchConfig {
    GridSearchConfig::new(
        (20..=100).step_by(10).collect(),
        vec![1.0, 1.5, 2.0, 2.5, 3.0],
        vec![0.1, 0.25, 0.5, 0.75, 1.0],
    )
    .with_filters(10, 200)
}

fn small_grid() -> GridSearchConfig {
    GridSearchConfig::new(vec![20, 30, 40], vec![1.5, 2.0], vec![0.25, 0.5]).with_filters(5, 100)
}

fn assert_ranked(result: &GridSearchResult) {
    let sharpes: Vec<f64> = result.iter().map(|r| r.sharpe_ratio()).collect();
    let first_nan = sharpes.iter().position(|s| s.is_nan()).unwrap_or(sharpes.len());
    assert!(sharpes[first_nan..].iter().all(|s| s.is_nan()));
    assert!(sharpes[..first_nan].windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn grid_search_on_cointegrated_pair() {
    init_tracing();
    let prices = cointegrated_prices(1000, 42);
    let cfg = wide_grid();
    let result = grid_search(&prices, &cfg);

    assert!(!result.is_empty());
    assert_ranked(&result);
    for row in &result {
        let p = row.params();
        assert!(p.entry_z > p.exit_z);
        assert!(row.run.observations >= cfg.min_obs);
        assert!(row.metrics().num_trades >= cfg.min_trades);
        assert_eq!(row.run.observations, prices.len() - (p.lookback - 1));
    }
}

#[test]
fn parallel_and_sequential_sweeps_agree() {
    let prices = cointegrated_prices(400, 5);
    let parallel = grid_search(&prices, &small_grid().with_parallel(true));
    let sequential = grid_search(&prices, &small_grid().with_parallel(false));

    assert_eq!(parallel.len(), sequential.len());
    for (a, b) in parallel.iter().zip(&sequential) {
        assert_eq!(a.params(), b.params());
        assert_eq!(a.run.observations, b.run.observations);
        assert_eq!(a.metrics().num_trades, b.metrics().num_trades);
        assert_eq!(a.total_return(), b.total_return());
    }
}

#[test]
fn progress_reports_every_combination() {
    let prices = cointegrated_prices(300, 9);
    let cfg = small_grid();
    let expected = cfg.combinations().count();

    let calls = AtomicUsize::new(0);
    let last_total = Mutex::new(0usize);
    let finished = AtomicUsize::new(0);
    let observer = |completed: usize, total: usize| {
        calls.fetch_add(1, Ordering::Relaxed);
        *last_total.lock().unwrap() = total;
        if completed == total {
            finished.fetch_add(1, Ordering::Relaxed);
        }
    };

    grid_search_with_progress(&prices, &cfg, &observer);
    assert_eq!(calls.load(Ordering::Relaxed), expected);
    assert_eq!(*last_total.lock().unwrap(), expected);
    assert_eq!(finished.load(Ordering::Relaxed), 1);
}

#[test]
fn empty_prices_give_empty_grid_with_schema() {
    let prices = pairs_optimizer::PriceTable::empty(("A", "B"));
    let result = grid_search(&prices, &wide_grid());
    assert!(result.is_empty());
    let df = result.to_dataframe().unwrap();
    assert_eq!(df.width(), GridSearchResult::COLUMNS.len());
    assert_eq!(df.height(), 0);
}

#[test]
fn strict_filters_leave_nothing() {
    let prices = cointegrated_prices(300, 2);
    let cfg = small_grid().with_filters(10_000, 0);
    assert!(grid_search(&prices, &cfg).is_empty());
    assert!(best_config(&prices, &cfg).is_none());
}

#[test]
fn grid_frame_matches_rows() {
    let prices = cointegrated_prices(400, 8);
    let result = grid_search(&prices, &small_grid());
    let df = result.to_dataframe().unwrap();
    assert_eq!(df.height(), result.len());
    assert_eq!(df.get_column_names(), GridSearchResult::COLUMNS.to_vec());
}

#[test]
fn best_config_is_top_row() {
    let prices = cointegrated_prices(400, 13);
    let cfg = small_grid();
    let result = grid_search(&prices, &cfg);
    let best = best_config(&prices, &cfg);
    assert_eq!(best.as_ref(), result.best());
}

#[test]
fn single_run_needs_two_rows_after_warmup() {
    let prices = table(vec![1.0, 2.0, 3.0, 2.5], vec![1.0, 1.5, 1.2, 1.4]);
    // lookback 3 leaves two rows, lookback 4 leaves one
    assert!(single_run(&prices, 3, 2.0, 0.5).is_some());
    assert!(single_run(&prices, 4, 2.0, 0.5).is_none());
}

#[test]
fn walk_forward_splits_chronologically() {
    let prices = cointegrated_prices(900, 21);
    let cfg = small_grid();
    let report = walk_forward_validation(&prices, &cfg, 0.7).unwrap();

    assert_eq!(report.train_rows, 630);
    assert_eq!(report.test_rows, 270);

    let train_best = report.train_best.expect("training window has a valid configuration");
    assert_eq!(train_best, best_config(&prices.slice(0..630), &cfg).unwrap());

    let test = report.test_metrics.expect("test window evaluates");
    assert_eq!(test.params, train_best.params());
    assert_eq!(test.observations, 270 - (train_best.params().lookback - 1));

    if report.train_sharpe != 0.0 && report.test_sharpe.is_finite() {
        let expected = (report.train_sharpe - report.test_sharpe) / report.train_sharpe.abs() * 100.0;
        assert!((report.sharpe_degradation - expected).abs() < 1e-9);
    }
}

#[test]
fn walk_forward_rejects_bad_fraction() {
    let prices = cointegrated_prices(50, 1);
    assert!(matches!(
        walk_forward_validation(&prices, &small_grid(), 1.0),
        Err(PairsError::InvalidRange(_))
    ));
}

#[test]
fn robustness_periods_are_ordered_and_bounded() {
    let prices = cointegrated_prices(900, 17);
    let rows = robustness_analysis(&prices, &small_grid(), 3).unwrap();

    assert!(rows.len() <= 3);
    assert!(rows.windows(2).all(|w| w[0].period < w[1].period && w[0].end < w[1].start));
    for row in &rows {
        assert!(row.start <= row.end);
        assert!((1..=3).contains(&row.period));
        assert_eq!(row.observations, 300);
    }
}

#[test]
fn robustness_rejects_single_period() {
    let prices = cointegrated_prices(50, 1);
    assert!(matches!(
        robustness_analysis(&prices, &small_grid(), 1),
        Err(PairsError::InvalidRange(_))
    ));
}

#[test]
fn cost_rows_follow_levels() {
    let prices = cointegrated_prices(600, 33);
    let levels = [0.0, 5.0, 10.0, 20.0, 50.0];
    let rows = transaction_cost_analysis(&prices, &small_grid(), &levels);
    assert_eq!(rows.len(), levels.len());

    let baseline = grid_search(&prices, &small_grid());
    let top = baseline.best().unwrap();
    // zero cost leaves every Sharpe untouched, so the grid leader stays on top
    if top.sharpe_ratio() > 0.0 && baseline.iter().all(|r| r.total_return() != 0.0) {
        assert_eq!(rows[0].adjusted_sharpe, top.sharpe_ratio());
    }

    for (row, level) in rows.iter().zip(levels) {
        assert_eq!(row.cost_bps, level);
        assert!(row.adjusted_return <= row.gross_return);
        let expected_drag = row.num_trades as f64 * 2.0 * level / 10_000.0;
        assert!((row.cost_drag - expected_drag).abs() < 1e-12);
    }
}

#[test]
fn stable_region_on_real_grid() {
    let prices = cointegrated_prices(800, 4);
    let result = grid_search(&prices, &small_grid());
    let tolerance = StabilityTolerance::default();
    let report = identify_stable_regions(&result, 5, &tolerance);

    assert_eq!(report.inspected, result.len().min(5));
    if let (Some((lo, hi)), Some(median)) = (report.lookback_range, report.median_params) {
        assert!(median.lookback >= lo as f64 && median.lookback <= hi as f64);
        assert_eq!(report.lookback_stable, hi - lo <= tolerance.lookback);
    }
    assert_eq!(
        report.overall_stable,
        report.lookback_stable && report.entry_z_stable && report.exit_z_stable
    );
}

#[test]
fn full_analysis_verdict_is_consistent() {
    init_tracing();
    let prices = cointegrated_prices(900, 99);
    let cfg = small_grid();
    let report = run_analysis(&prices, &cfg, &AnalysisConfig::default()).unwrap();

    assert_eq!(report.costs.len(), AnalysisConfig::default().cost_bps_range.len());
    assert!(report.stability.inspected <= 10);

    let degradation_ok = report.walk_forward.sharpe_degradation < 30.0;
    let sharpe_ok = report.grid.best().map_or(false, |b| b.sharpe_ratio() > 0.5);
    let expected_robust = degradation_ok && report.stability.overall_stable && sharpe_ok;

    match report.verdict() {
        Verdict::Robust => assert!(expected_robust),
        Verdict::NeedsRefinement { reasons } => {
            assert!(!expected_robust);
            assert!(!reasons.is_empty());
        }
    }

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("walk_forward"));
}
