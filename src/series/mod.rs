//! Timestamp and inter-arrival interval series
//!
//! A [`TimestampSeries`] holds the arrival times of one status message stream;
//! an [`IntervalSeries`] holds the consecutive differences between them. Each
//! interval is attributed to the later of the two packets it spans, so
//! interval `i` plots at `timestamp[i + 1]`.
//!
//! Non-monotonic timestamps produce negative intervals. They are kept as-is
//! and counted by [`IntervalSeries::negative_count`]: a reordered capture is
//! an anomaly worth seeing, not something to clamp away.

use arrow::array::Float64Array;
use serde::{Deserialize, Serialize};

/// Arrival times (seconds) of one status message stream, in capture order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimestampSeries {
    values: Vec<f64>,
}

impl TimestampSeries {
    /// Wrap timestamps in capture order
    #[must_use]
    pub const fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Timestamps as a slice
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of timestamps
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if no timestamps
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Timestamps from the second onward (the x-values of the interval series)
    #[must_use]
    pub fn tail(&self) -> &[f64] {
        self.values.get(1..).unwrap_or(&[])
    }
}

impl From<Vec<f64>> for TimestampSeries {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

/// Consecutive differences of a [`TimestampSeries`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntervalSeries {
    values: Vec<f64>,
}

impl IntervalSeries {
    /// Compute `timestamp[i + 1] - timestamp[i]` for every adjacent pair
    ///
    /// Output length is `max(n - 1, 0)`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use trueno_jitter::series::{IntervalSeries, TimestampSeries};
    ///
    /// let ts = TimestampSeries::new(vec![0.3, 0.5, 0.6]);
    /// let dts = IntervalSeries::from_timestamps(&ts);
    /// assert_eq!(dts.len(), 2);
    /// assert!((dts.values()[0] - 0.2).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn from_timestamps(timestamps: &TimestampSeries) -> Self {
        let values = timestamps
            .values()
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect();
        Self { values }
    }

    /// Intervals as a slice
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of intervals
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if no intervals
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest interval, `None` if empty
    #[must_use]
    pub fn max(&self) -> Option<f64> {
        arrow::compute::max(&self.to_array())
    }

    /// Smallest interval, `None` if empty
    #[must_use]
    pub fn min(&self) -> Option<f64> {
        arrow::compute::min(&self.to_array())
    }

    /// Number of negative intervals (reordered timestamps)
    #[must_use]
    pub fn negative_count(&self) -> usize {
        self.values.iter().filter(|&&dt| dt < 0.0).count()
    }

    /// `(time, interval)` pairs, time being the later packet's timestamp
    ///
    /// Pairs are truncated to the shorter input, so a mismatched timestamp
    /// series never panics.
    pub fn points<'a>(
        &'a self,
        timestamps: &'a TimestampSeries,
    ) -> impl Iterator<Item = (f64, f64)> + 'a {
        timestamps
            .tail()
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    /// Columnar view for Arrow compute kernels
    #[must_use]
    pub fn to_array(&self) -> Float64Array {
        Float64Array::from(self.values.clone())
    }
}
