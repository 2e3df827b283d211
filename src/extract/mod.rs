//! Status message extraction
//!
//! Reduces a mixed capture to the arrival times of the recurring status
//! datagram, bounded to the observation window `[0, capture_time]`.
//!
//! ```rust
//! use trueno_jitter::capture::{Capture, CaptureRecord};
//! use trueno_jitter::extract::StatusMessageExtractor;
//!
//! # fn main() -> trueno_jitter::Result<()> {
//! let capture = Capture::from_records(&[
//!     CaptureRecord::new(0.1, 50),
//!     CaptureRecord::new(0.2, 50),
//!     CaptureRecord::new(0.3, 200),
//!     CaptureRecord::new(0.4, 50),
//!     CaptureRecord::new(0.5, 200),
//! ])?;
//!
//! let timestamps = StatusMessageExtractor::default().extract(&capture)?;
//! assert_eq!(timestamps.values(), &[0.3, 0.5]);
//! # Ok(())
//! # }
//! ```

mod classifier;

pub use classifier::{ClassifierStrategy, LargestPayload, PayloadLength, RecordClassifier};

use crate::capture::Capture;
use crate::series::TimestampSeries;
use crate::{Error, Result};
use tracing::debug;

/// Default observation window in seconds
pub const DEFAULT_CAPTURE_TIME: f64 = 10.0;

/// Extracts windowed status message timestamps from a capture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusMessageExtractor {
    capture_time: f64,
    strategy: ClassifierStrategy,
}

impl Default for StatusMessageExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_CAPTURE_TIME)
    }
}

impl StatusMessageExtractor {
    /// Largest-payload extractor with the given window
    #[must_use]
    pub const fn new(capture_time: f64) -> Self {
        Self {
            capture_time,
            strategy: ClassifierStrategy::LargestPayload,
        }
    }

    /// Use a different classifier strategy
    #[must_use]
    pub const fn with_strategy(mut self, strategy: ClassifierStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Upper bound of the observation window (seconds, inclusive)
    #[must_use]
    pub const fn capture_time(&self) -> f64 {
        self.capture_time
    }

    /// Configured classifier strategy
    #[must_use]
    pub const fn strategy(&self) -> ClassifierStrategy {
        self.strategy
    }

    /// Timestamps of status messages at or before `capture_time`
    ///
    /// # Errors
    /// Returns `EmptyCapture` if the capture has no records
    pub fn extract(&self, capture: &Capture) -> Result<TimestampSeries> {
        let classifier = self
            .strategy
            .classifier_for(capture)
            .ok_or_else(|| empty_capture(capture))?;
        self.extract_with(capture, classifier.as_ref())
    }

    /// Like [`extract`](Self::extract) with a caller-supplied classifier
    ///
    /// # Errors
    /// Returns `EmptyCapture` if the capture has no records
    pub fn extract_with(
        &self,
        capture: &Capture,
        classifier: &dyn RecordClassifier,
    ) -> Result<TimestampSeries> {
        if capture.is_empty() {
            return Err(empty_capture(capture));
        }

        let mut matched = 0usize;
        let timestamps: Vec<f64> = capture
            .records()
            .filter(|record| classifier.classify(record))
            .inspect(|_| matched += 1)
            .map(|record| record.time_relative)
            .filter(|&t| t <= self.capture_time)
            .collect();

        debug!(
            source = %capture.source().display(),
            records = capture.num_records(),
            matched,
            windowed = timestamps.len(),
            capture_time = self.capture_time,
            "extracted status messages"
        );
        Ok(TimestampSeries::new(timestamps))
    }
}

fn empty_capture(capture: &Capture) -> Error {
    Error::EmptyCapture {
        path: capture.source().to_path_buf(),
    }
}
