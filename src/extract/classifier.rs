//! Status message classifiers
//!
//! Deciding which datagram is the status message is a content heuristic, not
//! protocol decoding. The default rule picks the largest payload in the
//! capture; [`RecordClassifier`] lets other rules slot in without touching the
//! extraction pipeline.

use crate::capture::{Capture, CaptureRecord};
use serde::{Deserialize, Serialize};

/// Predicate selecting status message records
pub trait RecordClassifier {
    /// True if `record` is an occurrence of the status message
    fn classify(&self, record: &CaptureRecord) -> bool;
}

impl<F> RecordClassifier for F
where
    F: Fn(&CaptureRecord) -> bool,
{
    fn classify(&self, record: &CaptureRecord) -> bool {
        self(record)
    }
}

/// Matches records whose payload equals the capture-wide maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LargestPayload {
    data_len: u64,
}

impl LargestPayload {
    /// Fit to a capture, `None` if the capture is empty
    #[must_use]
    pub fn fit(capture: &Capture) -> Option<Self> {
        capture.max_data_len().map(|data_len| Self { data_len })
    }

    /// The payload length being matched
    #[must_use]
    pub const fn data_len(&self) -> u64 {
        self.data_len
    }
}

impl RecordClassifier for LargestPayload {
    fn classify(&self, record: &CaptureRecord) -> bool {
        record.data_len == self.data_len
    }
}

/// Matches records with one exact payload length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadLength {
    data_len: u64,
}

impl PayloadLength {
    /// Match `data_len` bytes exactly
    #[must_use]
    pub const fn new(data_len: u64) -> Self {
        Self { data_len }
    }
}

impl RecordClassifier for PayloadLength {
    fn classify(&self, record: &CaptureRecord) -> bool {
        record.data_len == self.data_len
    }
}

/// Configurable choice of classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierStrategy {
    /// Largest payload in each capture is the status message
    #[default]
    LargestPayload,
    /// Fixed payload length, for links where the status size is known
    PayloadLength {
        /// Payload length in bytes
        data_len: u64,
    },
}

impl ClassifierStrategy {
    /// Build the classifier for one capture
    ///
    /// Returns `None` only for `LargestPayload` on an empty capture.
    #[must_use]
    pub fn classifier_for(&self, capture: &Capture) -> Option<Box<dyn RecordClassifier>> {
        match *self {
            Self::LargestPayload => LargestPayload::fit(capture)
                .map(|classifier| Box::new(classifier) as Box<dyn RecordClassifier>),
            Self::PayloadLength { data_len } => Some(Box::new(PayloadLength::new(data_len))),
        }
    }
}
