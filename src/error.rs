//! Error types for trueno-jitter
//!
//! Every error is fatal: captures are static artifacts, so there is nothing to
//! retry, and a masked failure would silently skew a comparison.

use crate::matrix::ExperimentCell;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// trueno-jitter error types
#[derive(Error, Debug)]
pub enum Error {
    /// Capture file missing or unreadable
    #[error("Capture source unavailable: {}: {source}", .path.display())]
    SourceUnavailable {
        /// Path that could not be opened
        path: PathBuf,
        /// Underlying IO failure
        #[source]
        source: std::io::Error,
    },

    /// Required field missing or non-numeric
    #[error("Malformed capture record in {}: {detail}", .path.display())]
    MalformedRecord {
        /// Capture file the record came from
        path: PathBuf,
        /// What was wrong, including the row where known
        detail: String,
    },

    /// Capture contains zero records
    #[error("Empty capture: {} contains no records", .path.display())]
    EmptyCapture {
        /// Capture file with no records
        path: PathBuf,
    },

    /// Output image could not be produced
    #[error("Render failure for {}: {detail}", .path.display())]
    RenderFailure {
        /// Output image path
        path: PathBuf,
        /// Backend or filesystem failure
        detail: String,
    },

    /// Failure while building one experiment cell
    #[error("Experiment cell {cell} failed: {source}")]
    Cell {
        /// Cell whose capture failed
        cell: ExperimentCell,
        /// Originating error
        #[source]
        source: Box<Error>,
    },

    /// Configuration rejected during validation or parsing
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Annotate an error with the experiment cell it originated from
    #[must_use]
    pub fn in_cell(self, cell: ExperimentCell) -> Self {
        Self::Cell {
            cell,
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping cell annotations
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Cell { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// The experiment cell this error is attributed to, if any
    #[must_use]
    pub fn cell(&self) -> Option<ExperimentCell> {
        match self {
            Self::Cell { cell, .. } => Some(*cell),
            _ => None,
        }
    }
}
