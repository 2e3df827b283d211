//! Property-based tests for trueno-jitter
//!
//! - Test extraction and interval invariants over random captures
//! - Test shared-scale invariants over random matrices
//! - Run with ProptestConfig::with_cases(100)

use proptest::prelude::*;
use trueno_jitter::capture::{Capture, CaptureRecord};
use trueno_jitter::extract::StatusMessageExtractor;
use trueno_jitter::matrix::{
    shared_scale, CellSeries, ExperimentCell, ExperimentMatrix, NetworkPath, RobotMode,
};
use trueno_jitter::series::{IntervalSeries, TimestampSeries};

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Capture rows in time order with a small payload alphabet, so the maximum
/// length repeats often
fn arb_capture_rows() -> impl Strategy<Value = Vec<(f64, u64)>> {
    prop::collection::vec((0.0f64..15.0, prop::sample::select(vec![40u64, 64, 1200])), 1..300)
        .prop_map(|mut rows| {
            rows.sort_by(|a, b| a.0.total_cmp(&b.0));
            rows
        })
}

/// Ascending timestamp series
fn arb_timestamps() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..10.0, 0..100).prop_map(|mut ts| {
        ts.sort_by(f64::total_cmp);
        ts
    })
}

fn capture(rows: &[(f64, u64)]) -> Capture {
    let records: Vec<_> = rows
        .iter()
        .map(|&(t, len)| CaptureRecord::new(t, len))
        .collect();
    Capture::from_records(&records).unwrap()
}

fn full_matrix(series: Vec<Vec<f64>>) -> ExperimentMatrix {
    let cells = ExperimentCell::grid(&NetworkPath::ALL, &RobotMode::ALL)
        .zip(series)
        .map(|(cell, ts)| (cell, CellSeries::from_timestamps(TimestampSeries::new(ts))))
        .collect();
    ExperimentMatrix::from_cells(NetworkPath::ALL.to_vec(), RobotMode::ALL.to_vec(), 10.0, cells)
        .unwrap()
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: extracted timestamps are max-length records within the window
    #[test]
    fn prop_extracted_subset_of_max_length_records(
        rows in arb_capture_rows(),
        capture_time in 0.1f64..15.0
    ) {
        let max_len = rows.iter().map(|r| r.1).max().unwrap();
        let ts = StatusMessageExtractor::new(capture_time)
            .extract(&capture(&rows))
            .unwrap();

        for &t in ts.values() {
            prop_assert!(t <= capture_time);
            prop_assert!(rows.iter().any(|r| r.0 == t && r.1 == max_len));
        }
        let expected = rows
            .iter()
            .filter(|r| r.1 == max_len && r.0 <= capture_time)
            .count();
        prop_assert_eq!(ts.len(), expected);
    }

    /// Property: interval length is max(n - 1, 0), all non-negative
    #[test]
    fn prop_interval_length_and_sign(ts in arb_timestamps()) {
        let n = ts.len();
        let dts = IntervalSeries::from_timestamps(&TimestampSeries::new(ts));
        prop_assert_eq!(dts.len(), n.saturating_sub(1));
        prop_assert!(dts.values().iter().all(|&dt| dt >= 0.0));
    }

    /// Property: extraction is a pure function of the capture
    #[test]
    fn prop_extraction_is_deterministic(rows in arb_capture_rows()) {
        let capture = capture(&rows);
        let extractor = StatusMessageExtractor::default();
        let first = IntervalSeries::from_timestamps(&extractor.extract(&capture).unwrap());
        let second = IntervalSeries::from_timestamps(&extractor.extract(&capture).unwrap());
        prop_assert_eq!(first, second);
    }

    /// Property: shared scale is the maximum interval (0 if none)
    #[test]
    fn prop_shared_scale_is_global_max(
        series in prop::collection::vec(arb_timestamps(), 6)
    ) {
        let matrix = full_matrix(series);
        let expected = matrix
            .cells()
            .iter()
            .flat_map(|(_, s)| s.intervals.values().iter().copied())
            .fold(0.0, f64::max);

        prop_assert!((matrix.shared_scale() - expected).abs() < 1e-12);
        for (_, s) in matrix.cells() {
            prop_assert!(s.intervals.max().unwrap_or(0.0) <= matrix.shared_scale());
        }
    }

    /// Property: the fold does not depend on cell order
    #[test]
    fn prop_shared_scale_order_independent(
        series in prop::collection::vec(arb_timestamps(), 1..8)
    ) {
        let intervals: Vec<IntervalSeries> = series
            .iter()
            .map(|ts| IntervalSeries::from_timestamps(&TimestampSeries::new(ts.clone())))
            .collect();
        let forward = shared_scale(intervals.iter());
        let backward = shared_scale(intervals.iter().rev());
        prop_assert!((forward - backward).abs() < f64::EPSILON);
    }

    /// Property: grid order is paths outer, modes inner, for any subset order
    #[test]
    fn prop_grid_order(
        paths in Just(NetworkPath::ALL.to_vec()).prop_shuffle(),
        modes in Just(RobotMode::ALL.to_vec()).prop_shuffle()
    ) {
        let cells: Vec<_> = ExperimentCell::grid(&paths, &modes).collect();
        prop_assert_eq!(cells.len(), paths.len() * modes.len());
        for (i, cell) in cells.iter().enumerate() {
            prop_assert_eq!(cell.path, paths[i / modes.len()]);
            prop_assert_eq!(cell.mode, modes[i % modes.len()]);
        }
    }
}
