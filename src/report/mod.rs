//! Per-cell jitter statistics
//!
//! A textual companion to the rendered grid: the same matrix, reduced to a
//! handful of numbers per cell and serialized as JSON.

use crate::matrix::{CellSeries, ExperimentCell, ExperimentMatrix};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Jitter statistics of one experiment cell (seconds)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellSummary {
    /// Which cell
    #[serde(flatten)]
    pub cell: ExperimentCell,
    /// Status messages inside the observation window
    pub status_messages: usize,
    /// Number of intervals
    pub intervals: usize,
    /// Mean interval
    pub mean: Option<f64>,
    /// Population standard deviation of intervals
    pub std_dev: Option<f64>,
    /// Smallest interval
    pub min: Option<f64>,
    /// Median interval
    pub p50: Option<f64>,
    /// 99th percentile interval (nearest rank)
    pub p99: Option<f64>,
    /// Largest interval
    pub max: Option<f64>,
    /// Intervals below zero (reordered timestamps)
    pub negative_intervals: usize,
}

impl CellSummary {
    /// Summarize one cell's series
    #[must_use]
    pub fn from_series(cell: ExperimentCell, series: &CellSeries) -> Self {
        let intervals = &series.intervals;
        let array = intervals.to_array();
        let n = intervals.len();

        #[allow(clippy::cast_precision_loss)]
        let mean = arrow::compute::sum(&array).map(|total| total / n as f64);
        #[allow(clippy::cast_precision_loss)]
        let std_dev = mean.map(|mean| {
            let variance = intervals
                .values()
                .iter()
                .map(|dt| (dt - mean).powi(2))
                .sum::<f64>()
                / n as f64;
            variance.sqrt()
        });

        let mut sorted = intervals.values().to_vec();
        sorted.sort_by(f64::total_cmp);

        Self {
            cell,
            status_messages: series.timestamps.len(),
            intervals: n,
            mean,
            std_dev,
            min: intervals.min(),
            p50: percentile(&sorted, 50.0),
            p99: percentile(&sorted, 99.0),
            max: intervals.max(),
            negative_intervals: intervals.negative_count(),
        }
    }
}

/// Nearest-rank percentile of ascending `sorted`, `None` if empty
fn percentile(sorted: &[f64], pct: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted.get(rank.clamp(1, sorted.len()) - 1).copied()
}

/// Summary of a whole experiment matrix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JitterReport {
    /// When the report was produced
    pub generated_at: DateTime<Utc>,
    /// Observation window (seconds)
    pub capture_time: f64,
    /// Shared y-scale of the rendered grid
    pub shared_scale: f64,
    /// Cells in grid order
    pub cells: Vec<CellSummary>,
}

impl JitterReport {
    /// Summarize every cell of `matrix`
    #[must_use]
    pub fn from_matrix(matrix: &ExperimentMatrix) -> Self {
        Self {
            generated_at: Utc::now(),
            capture_time: matrix.capture_time(),
            shared_scale: matrix.shared_scale(),
            cells: matrix
                .cells()
                .iter()
                .map(|(cell, series)| CellSummary::from_series(*cell, series))
                .collect(),
        }
    }

    /// Serialize as JSON
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self, pretty: bool) -> crate::Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.map_err(|e| crate::Error::Other(format!("Failed to serialize report: {e}")))
    }
}
