//! Comparative rendering
//!
//! One figure, one subplot per experiment cell: rows are network paths,
//! columns are robot modes, in matrix order. Every subplot shares the same
//! axes, x over `[0, capture_time]` and y over `[0, shared_scale]`, so a
//! taller trace in one cell really is a longer gap.
//!
//! The backend follows the output extension: `.svg` renders vector output,
//! anything else goes through the bitmap encoder (PNG for `.png`).

use crate::config::JitterConfig;
use crate::matrix::{CellSeries, ExperimentCell, ExperimentMatrix};
use crate::{Error, Result};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::info;

/// Y-axis span used when there is no interval to scale to
pub const MIN_Y_SPAN: f64 = 1e-3;

/// Size of a standalone single-capture plot
pub const SINGLE_FIGURE_SIZE: (u32, u32) = (800, 600);

const FIGURE_FONT: &str = "sans-serif";

type DrawResult<DB> = std::result::Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

/// Output encoding, chosen from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Scalable vector graphics
    Svg,
    /// Raster image (format from extension, e.g. PNG)
    Bitmap,
}

impl OutputFormat {
    /// Pick the format for an output path
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => Self::Svg,
            _ => Self::Bitmap,
        }
    }
}

/// Renders an [`ExperimentMatrix`] into one combined figure
#[derive(Debug, Clone)]
pub struct ComparativeRenderer {
    output: PathBuf,
    size: (u32, u32),
}

impl ComparativeRenderer {
    /// Renderer writing a `width` × `height` figure to `output`
    #[must_use]
    pub fn new<P: Into<PathBuf>>(output: P, size: (u32, u32)) -> Self {
        Self {
            output: output.into(),
            size,
        }
    }

    /// Renderer using the configured output path and figure size
    #[must_use]
    pub fn from_config(config: &JitterConfig) -> Self {
        Self::new(&config.output, (config.width, config.height))
    }

    /// Output image path
    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Draw the grid and write it, replacing any existing file
    ///
    /// # Errors
    /// Returns `RenderFailure` if the output directory cannot be created or
    /// the figure cannot be drawn or written
    pub fn render(&self, matrix: &ExperimentMatrix) -> Result<()> {
        render_figure(&self.output, self.size, &MatrixFigure { matrix })?;
        info!(
            output = %self.output.display(),
            cells = matrix.len(),
            shared_scale = matrix.shared_scale(),
            "rendered comparative figure"
        );
        Ok(())
    }
}

/// Plot one capture on its own: x over `[0, capture_time]`, y from zero to the
/// series' own maximum
///
/// # Errors
/// Returns `RenderFailure` if the figure cannot be drawn or written
pub fn render_single(
    output: &Path,
    title: &str,
    series: &CellSeries,
    capture_time: f64,
) -> Result<()> {
    let figure = SingleFigure {
        title,
        series,
        capture_time,
    };
    render_figure(output, SINGLE_FIGURE_SIZE, &figure)?;
    info!(output = %output.display(), title, "rendered capture plot");
    Ok(())
}

/// Something drawable onto any plotters backend
trait Figure {
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> DrawResult<DB>;
}

struct MatrixFigure<'a> {
    matrix: &'a ExperimentMatrix,
}

impl Figure for MatrixFigure<'_> {
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> DrawResult<DB> {
        let matrix = self.matrix;
        root.fill(&WHITE)?;
        let root = root.titled(
            &format!(
                "Status message inter-arrival time (first {} s)",
                matrix.capture_time()
            ),
            (FIGURE_FONT, 28),
        )?;

        let panels = root.split_evenly((matrix.paths().len(), matrix.modes().len()));
        let (x_range, y_range) = panel_ranges(matrix);
        for (panel, (cell, series)) in panels.iter().zip(matrix.cells()) {
            let caption = panel_caption(*cell, series);
            draw_panel(panel, &caption, series, x_range.clone(), y_range.clone())?;
        }
        Ok(())
    }
}

/// Axis ranges shared by every panel of the grid
fn panel_ranges(matrix: &ExperimentMatrix) -> (Range<f64>, Range<f64>) {
    (
        0.0..matrix.capture_time(),
        0.0..axis_upper(matrix.shared_scale()),
    )
}

/// Panel caption; negative intervals fall below the y floor, so flag them
fn panel_caption(cell: ExperimentCell, series: &CellSeries) -> String {
    match series.intervals.negative_count() {
        0 => format!("{} / {}", cell.path, cell.mode),
        n => format!("{} / {} ({n} negative dt)", cell.path, cell.mode),
    }
}

struct SingleFigure<'a> {
    title: &'a str,
    series: &'a CellSeries,
    capture_time: f64,
}

impl Figure for SingleFigure<'_> {
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> DrawResult<DB> {
        root.fill(&WHITE)?;
        let y_max = axis_upper(self.series.intervals.max().unwrap_or(0.0));
        draw_panel(
            root,
            self.title,
            self.series,
            0.0..self.capture_time,
            0.0..y_max,
        )
    }
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    caption: &str,
    series: &CellSeries,
    x_range: Range<f64>,
    y_range: Range<f64>,
) -> DrawResult<DB> {
    let mut chart = ChartBuilder::on(area)
        .caption(caption, (FIGURE_FONT, 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("time (sec)")
        .y_desc("dt (sec)")
        .draw()?;

    chart.draw_series(LineSeries::new(
        series.intervals.points(&series.timestamps),
        &BLUE,
    ))?;
    Ok(())
}

fn axis_upper(scale: f64) -> f64 {
    if scale > 0.0 {
        scale
    } else {
        MIN_Y_SPAN
    }
}

fn render_figure<F: Figure>(output: &Path, size: (u32, u32), figure: &F) -> Result<()> {
    let failure = |detail: String| Error::RenderFailure {
        path: output.to_path_buf(),
        detail,
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| failure(format!("cannot create {}: {e}", parent.display())))?;
    }

    let drawn = match OutputFormat::from_path(output) {
        OutputFormat::Svg => {
            let root = SVGBackend::new(output, size).into_drawing_area();
            figure
                .draw(&root)
                .and_then(|()| root.present())
                .map_err(|e| e.to_string())
        }
        OutputFormat::Bitmap => {
            let root = BitMapBackend::new(output, size).into_drawing_area();
            figure
                .draw(&root)
                .and_then(|()| root.present())
                .map_err(|e| e.to_string())
        }
    };
    drawn.map_err(failure)
}
