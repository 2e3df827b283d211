//! # Trueno-Jitter: Comparative Jitter Analysis for Robot-Control Links
//!
//! **Version**: 0.1.0
//!
//! Trueno-Jitter reduces packet-capture exports of a robot-control UDP link to
//! the arrival times of its recurring status datagram, turns them into
//! inter-arrival intervals, and lays every (network path, robot mode)
//! configuration side by side on shared axes.
//!
//! ## Pipeline
//!
//! ```text
//! <root>/<path>/<mode>.csv ─► Capture ─► StatusMessageExtractor ─► IntervalSeries
//!                                                                      │
//!                       ComparativeRenderer ◄── ExperimentMatrix ◄─────┘
//! ```
//!
//! Analysis is offline and all-or-nothing: a missing or malformed capture
//! aborts the run with the failing cell named, rather than producing a grid
//! with holes in it.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use trueno_jitter::matrix::MatrixLoader;
//! use trueno_jitter::render::ComparativeRenderer;
//!
//! let matrix = MatrixLoader::new("/tmp/franka_timing")
//!     .capture_time(10.0)
//!     .load()?;
//!
//! ComparativeRenderer::new("/tmp/franka_timing/matrix.png", (1600, 1200))
//!     .render(&matrix)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod capture;
pub mod config;
pub mod error;
pub mod extract;
pub mod matrix;
pub mod render;
pub mod report;
pub mod series;

pub use error::{Error, Result};

use config::JitterConfig;
use matrix::{ExperimentMatrix, MatrixLoader};
use render::ComparativeRenderer;

/// Build the experiment matrix described by `config` and render it
///
/// Nothing is written unless every cell loads.
///
/// # Errors
///
/// Returns the first failing cell's error, or `RenderFailure`
pub fn run(config: &JitterConfig) -> Result<ExperimentMatrix> {
    let matrix = MatrixLoader::from_config(config).load()?;
    ComparativeRenderer::from_config(config).render(&matrix)?;
    Ok(matrix)
}
