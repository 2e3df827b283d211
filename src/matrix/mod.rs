//! Experiment matrix: one interval series per (network path, robot mode)
//!
//! The loader walks the configured grid (paths outer, modes inner), runs
//! load → extract → diff for each cell, and derives the shared y-scale used
//! to put every subplot on the same axes.
//!
//! The build is all-or-nothing: the first failing cell (in grid order) aborts
//! it, annotated with the cell identity. A partial grid would invite
//! comparisons against data that is silently missing.

mod cell;

pub use cell::{ExperimentCell, NetworkPath, RobotMode};

use crate::capture::Capture;
use crate::config::JitterConfig;
use crate::extract::{ClassifierStrategy, StatusMessageExtractor, DEFAULT_CAPTURE_TIME};
use crate::series::{IntervalSeries, TimestampSeries};
use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default capture export extension
pub const DEFAULT_EXTENSION: &str = "csv";

/// Timestamps and intervals of one experiment cell
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CellSeries {
    /// Windowed status message arrival times
    pub timestamps: TimestampSeries,
    /// Inter-arrival intervals of `timestamps`
    pub intervals: IntervalSeries,
}

impl CellSeries {
    /// Derive the interval series from timestamps
    #[must_use]
    pub fn from_timestamps(timestamps: TimestampSeries) -> Self {
        let intervals = IntervalSeries::from_timestamps(&timestamps);
        Self {
            timestamps,
            intervals,
        }
    }
}

/// Largest interval across all series, `0.0` if every series is empty
///
/// A pure fold, so cells may be computed in any order.
#[must_use]
pub fn shared_scale<'a, I>(series: I) -> f64
where
    I: IntoIterator<Item = &'a IntervalSeries>,
{
    series
        .into_iter()
        .filter_map(IntervalSeries::max)
        .fold(0.0, f64::max)
}

/// Per-cell series for a full grid, in grid order
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentMatrix {
    paths: Vec<NetworkPath>,
    modes: Vec<RobotMode>,
    capture_time: f64,
    cells: Vec<(ExperimentCell, CellSeries)>,
    shared_scale: f64,
}

impl ExperimentMatrix {
    /// Assemble a matrix from precomputed cells
    ///
    /// # Errors
    /// Returns `InvalidConfig` if `cells` is not exactly the `paths` × `modes`
    /// grid in grid order
    pub fn from_cells(
        paths: Vec<NetworkPath>,
        modes: Vec<RobotMode>,
        capture_time: f64,
        cells: Vec<(ExperimentCell, CellSeries)>,
    ) -> Result<Self> {
        let expected: Vec<ExperimentCell> = ExperimentCell::grid(&paths, &modes).collect();
        let actual: Vec<ExperimentCell> = cells.iter().map(|(cell, _)| *cell).collect();
        if expected != actual {
            return Err(Error::InvalidConfig(format!(
                "cells do not match grid order: expected {expected:?}, got {actual:?}"
            )));
        }

        let shared_scale = shared_scale(cells.iter().map(|(_, series)| &series.intervals));
        Ok(Self {
            paths,
            modes,
            capture_time,
            cells,
            shared_scale,
        })
    }

    /// Grid rows
    #[must_use]
    pub fn paths(&self) -> &[NetworkPath] {
        &self.paths
    }

    /// Grid columns
    #[must_use]
    pub fn modes(&self) -> &[RobotMode] {
        &self.modes
    }

    /// Observation window used for every cell
    #[must_use]
    pub const fn capture_time(&self) -> f64 {
        self.capture_time
    }

    /// Maximum interval across all cells (`0.0` if none)
    #[must_use]
    pub const fn shared_scale(&self) -> f64 {
        self.shared_scale
    }

    /// Cells in grid order
    #[must_use]
    pub fn cells(&self) -> &[(ExperimentCell, CellSeries)] {
        &self.cells
    }

    /// Look up one cell
    #[must_use]
    pub fn get(&self, cell: ExperimentCell) -> Option<&CellSeries> {
        self.cells
            .iter()
            .find(|(candidate, _)| *candidate == cell)
            .map(|(_, series)| series)
    }

    /// Number of cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if the grid has no cells
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Builds an [`ExperimentMatrix`] from capture exports on disk
#[derive(Debug, Clone)]
pub struct MatrixLoader {
    root: PathBuf,
    paths: Vec<NetworkPath>,
    modes: Vec<RobotMode>,
    extension: String,
    extractor: StatusMessageExtractor,
}

impl MatrixLoader {
    /// Loader over the full grid with default settings
    #[must_use]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            paths: NetworkPath::ALL.to_vec(),
            modes: RobotMode::ALL.to_vec(),
            extension: DEFAULT_EXTENSION.to_string(),
            extractor: StatusMessageExtractor::new(DEFAULT_CAPTURE_TIME),
        }
    }

    /// Loader configured from a [`JitterConfig`]
    #[must_use]
    pub fn from_config(config: &JitterConfig) -> Self {
        Self::new(&config.root)
            .paths(config.network_paths.clone())
            .modes(config.robot_modes.clone())
            .extension(config.capture_extension.clone())
            .capture_time(config.capture_time)
            .strategy(config.classifier)
    }

    /// Set grid rows (in order)
    #[must_use]
    pub fn paths(mut self, paths: Vec<NetworkPath>) -> Self {
        self.paths = paths;
        self
    }

    /// Set grid columns (in order)
    #[must_use]
    pub fn modes(mut self, modes: Vec<RobotMode>) -> Self {
        self.modes = modes;
        self
    }

    /// Set the capture file extension
    #[must_use]
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Set the observation window (seconds)
    #[must_use]
    pub fn capture_time(mut self, capture_time: f64) -> Self {
        self.extractor = StatusMessageExtractor::new(capture_time)
            .with_strategy(self.extractor.strategy());
        self
    }

    /// Set the status message classifier
    #[must_use]
    pub fn strategy(mut self, strategy: ClassifierStrategy) -> Self {
        self.extractor = self.extractor.with_strategy(strategy);
        self
    }

    /// Capture root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Capture file for one cell
    #[must_use]
    pub fn capture_file(&self, cell: ExperimentCell) -> PathBuf {
        cell.capture_file(&self.root, &self.extension)
    }

    /// Load, extract, and diff one cell
    ///
    /// # Errors
    /// Any capture or extraction error, wrapped in `Error::Cell`
    pub fn load_cell(&self, cell: ExperimentCell) -> Result<CellSeries> {
        self.load_cell_inner(cell).map_err(|e| e.in_cell(cell))
    }

    fn load_cell_inner(&self, cell: ExperimentCell) -> Result<CellSeries> {
        let file = self.capture_file(cell);
        debug!(%cell, file = %file.display(), "loading experiment cell");

        let capture = Capture::load_csv(&file)?;
        let timestamps = self.extractor.extract(&capture)?;
        let series = CellSeries::from_timestamps(timestamps);

        if series.timestamps.is_empty() {
            warn!(%cell, "no status messages inside the observation window");
        }
        let negative = series.intervals.negative_count();
        if negative > 0 {
            warn!(%cell, negative, "non-monotonic timestamps produced negative intervals");
        }
        debug!(
            %cell,
            status_messages = series.timestamps.len(),
            max_interval = series.intervals.max().unwrap_or(0.0),
            "experiment cell loaded"
        );
        Ok(series)
    }

    /// Build the full matrix
    ///
    /// # Errors
    /// - `InvalidConfig` if the path or mode list is empty
    /// - The first failing cell's error (in grid order), wrapped in
    ///   `Error::Cell`
    pub fn load(&self) -> Result<ExperimentMatrix> {
        if self.paths.is_empty() || self.modes.is_empty() {
            return Err(Error::InvalidConfig(
                "experiment grid needs at least one network path and one robot mode".to_string(),
            ));
        }

        let grid: Vec<ExperimentCell> = ExperimentCell::grid(&self.paths, &self.modes).collect();
        info!(
            root = %self.root.display(),
            cells = grid.len(),
            capture_time = self.extractor.capture_time(),
            "building experiment matrix"
        );

        let cells = self.load_grid(&grid)?;
        let matrix = ExperimentMatrix::from_cells(
            self.paths.clone(),
            self.modes.clone(),
            self.extractor.capture_time(),
            cells,
        )?;

        info!(shared_scale = matrix.shared_scale(), "experiment matrix built");
        Ok(matrix)
    }

    #[cfg(not(feature = "parallel"))]
    fn load_grid(&self, grid: &[ExperimentCell]) -> Result<Vec<(ExperimentCell, CellSeries)>> {
        grid.iter()
            .map(|&cell| self.load_cell(cell).map(|series| (cell, series)))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn load_grid(&self, grid: &[ExperimentCell]) -> Result<Vec<(ExperimentCell, CellSeries)>> {
        use rayon::prelude::*;

        // Indexed collect keeps grid order; the sequential pass then reports
        // the first failure in that order.
        let results: Vec<Result<(ExperimentCell, CellSeries)>> = grid
            .par_iter()
            .map(|&cell| self.load_cell(cell).map(|series| (cell, series)))
            .collect();
        results.into_iter().collect()
    }
}
