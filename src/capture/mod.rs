//! Capture record source (CSV → Arrow)
//!
//! A capture export is the tabular dump of one packet capture, e.g.
//!
//! ```text
//! tshark -r run.pcap -T fields -E header=y -E separator=, -E quote=d \
//!     -e frame.number -e frame.time_relative -e ip.src -e ip.dst -e data.len
//! ```
//!
//! Only `frame.time_relative` and `data.len` are interpreted. Every other
//! column is projected away at read time, so exports with extra fields load
//! unchanged.
//!
//! Records are held columnar (append-only `RecordBatch`es with a fixed
//! two-column schema) and exposed row-wise through [`Capture::records`].

use crate::{Error, Result};
use arrow::array::{Array, AsArray, Float64Array, PrimitiveArray, UInt64Array};
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{
    ArrowPrimitiveType, DataType, Field, Float64Type, Schema, SchemaRef, UInt64Type,
};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Column holding seconds since capture start
pub const TIME_RELATIVE_COLUMN: &str = "frame.time_relative";

/// Column holding the UDP payload length in bytes
pub const DATA_LEN_COLUMN: &str = "data.len";

/// Rows decoded per record batch
pub const CSV_BATCH_SIZE: usize = 8192;

/// Source label for captures built in memory
const IN_MEMORY_SOURCE: &str = "<in-memory>";

/// One observed datagram
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureRecord {
    /// Seconds since capture start
    pub time_relative: f64,
    /// Payload length in bytes
    pub data_len: u64,
}

impl CaptureRecord {
    /// Create a record
    #[must_use]
    pub const fn new(time_relative: f64, data_len: u64) -> Self {
        Self {
            time_relative,
            data_len,
        }
    }
}

/// Canonical schema of every batch held by a [`Capture`]
#[must_use]
pub fn capture_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(TIME_RELATIVE_COLUMN, DataType::Float64, false),
        Field::new(DATA_LEN_COLUMN, DataType::UInt64, false),
    ]))
}

/// All records of one capture export, in file order
#[derive(Debug, Clone)]
pub struct Capture {
    source: PathBuf,
    batches: Vec<RecordBatch>,
}

impl Capture {
    /// Build a capture from in-memory records
    ///
    /// Useful for testing and benchmarking
    ///
    /// # Errors
    /// Returns error if the record batch cannot be assembled
    pub fn from_records(records: &[CaptureRecord]) -> Result<Self> {
        let times = Float64Array::from_iter_values(records.iter().map(|r| r.time_relative));
        let lens = UInt64Array::from_iter_values(records.iter().map(|r| r.data_len));
        let batch = RecordBatch::try_new(capture_schema(), vec![Arc::new(times), Arc::new(lens)])?;

        Ok(Self {
            source: PathBuf::from(IN_MEMORY_SOURCE),
            batches: vec![batch],
        })
    }

    /// Build a capture from existing batches
    ///
    /// # Errors
    /// Returns `MalformedRecord` if any batch does not use [`capture_schema`]
    pub fn from_batches<P: Into<PathBuf>>(source: P, batches: Vec<RecordBatch>) -> Result<Self> {
        let mut capture = Self {
            source: source.into(),
            batches: Vec::with_capacity(batches.len()),
        };
        for batch in batches {
            capture.append_batch(batch)?;
        }
        Ok(capture)
    }

    /// Load a capture from a CSV export
    ///
    /// A zero-byte file or a header-only file yields an empty capture.
    ///
    /// # Errors
    /// - `SourceUnavailable` if the file cannot be opened or read, or is a
    ///   directory
    /// - `MalformedRecord` if a required column is absent, or any row has a
    ///   missing, non-numeric, or negative value in one of them, or a
    ///   non-finite time
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_csv_with_batch_size(path, CSV_BATCH_SIZE)
    }

    pub(crate) fn load_csv_with_batch_size<P: AsRef<Path>>(
        path: P,
        batch_size: usize,
    ) -> Result<Self> {
        let path = path.as_ref();
        let unavailable = |source: std::io::Error| Error::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        };
        let malformed = |detail: String| Error::MalformedRecord {
            path: path.to_path_buf(),
            detail,
        };

        let file = File::open(path).map_err(unavailable)?;
        // Opening a directory succeeds on some platforms; reading it does not
        if file.metadata().map_err(unavailable)?.is_dir() {
            return Err(unavailable(std::io::Error::other("is a directory")));
        }

        let mut file = FailureTracking::new(file);
        let format = Format::default().with_header(true);
        let (header, _) = match format.infer_schema(&mut file, Some(0)) {
            Ok(inferred) => inferred,
            Err(e) => {
                return Err(match file.take_failure() {
                    Some(source) => unavailable(source),
                    None => malformed(format!("Failed to read header: {e}")),
                })
            }
        };
        let mut file = file.into_inner();

        if header.fields().is_empty() {
            debug!(path = %path.display(), "capture export has no header; treating as empty");
            return Ok(Self {
                source: path.to_path_buf(),
                batches: Vec::new(),
            });
        }

        let time_idx = column_index(&header, TIME_RELATIVE_COLUMN)
            .ok_or_else(|| malformed(format!("missing required column '{TIME_RELATIVE_COLUMN}'")))?;
        let len_idx = column_index(&header, DATA_LEN_COLUMN)
            .ok_or_else(|| malformed(format!("missing required column '{DATA_LEN_COLUMN}'")))?;

        // Opaque columns stay Utf8 and are projected away before decoding
        let read_schema = Schema::new(
            header
                .fields()
                .iter()
                .enumerate()
                .map(|(i, field)| {
                    let data_type = if i == time_idx {
                        DataType::Float64
                    } else if i == len_idx {
                        DataType::UInt64
                    } else {
                        DataType::Utf8
                    };
                    Field::new(field.name(), data_type, true)
                })
                .collect::<Vec<_>>(),
        );

        file.seek(SeekFrom::Start(0)).map_err(unavailable)?;

        let reader = ReaderBuilder::new(Arc::new(read_schema))
            .with_header(true)
            .with_batch_size(batch_size)
            .with_projection(vec![time_idx, len_idx])
            .build(file)
            .map_err(|e| malformed(format!("Failed to create CSV reader: {e}")))?;

        let mut capture = Self {
            source: path.to_path_buf(),
            batches: Vec::new(),
        };
        for batch in reader {
            let batch = batch.map_err(|e| match e {
                ArrowError::IoError(_, source) => unavailable(source),
                e => malformed(format!("Failed to parse record batch: {e}")),
            })?;
            let batch = canonicalize(&batch, capture.num_records()).map_err(malformed)?;
            capture.batches.push(batch);
        }

        debug!(
            path = %path.display(),
            records = capture.num_records(),
            batches = capture.batches.len(),
            "loaded capture export"
        );
        Ok(capture)
    }

    /// Where this capture was read from
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Get all record batches
    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Total number of records
    #[must_use]
    pub fn num_records(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    /// True if the capture holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_records() == 0
    }

    /// Records in file order
    pub fn records(&self) -> impl Iterator<Item = CaptureRecord> + '_ {
        self.batches.iter().flat_map(|batch| {
            let (times, lens) = columns(batch);
            times
                .values()
                .iter()
                .zip(lens.values().iter())
                .map(|(&time_relative, &data_len)| CaptureRecord {
                    time_relative,
                    data_len,
                })
        })
    }

    /// Largest payload length in the capture, `None` if empty
    #[must_use]
    pub fn max_data_len(&self) -> Option<u64> {
        self.batches
            .iter()
            .filter_map(|batch| arrow::compute::max(columns(batch).1))
            .max()
    }

    /// Append a batch (append-only, like the capture file itself)
    ///
    /// # Errors
    /// Returns `MalformedRecord` if the batch schema is not [`capture_schema`]
    pub fn append_batch(&mut self, batch: RecordBatch) -> Result<()> {
        let expected = capture_schema();
        if batch.schema().fields() != expected.fields() {
            return Err(Error::MalformedRecord {
                path: self.source.clone(),
                detail: format!(
                    "Schema mismatch: expected {:?}, got {:?}",
                    expected,
                    batch.schema()
                ),
            });
        }

        self.batches.push(batch);
        Ok(())
    }
}

/// Read adapter that keeps the first IO failure.
///
/// The CSV header parser flattens IO errors into strings; this lets an
/// unreadable source still surface as `SourceUnavailable`.
struct FailureTracking<R> {
    inner: R,
    failure: Option<std::io::Error>,
}

impl<R> FailureTracking<R> {
    const fn new(inner: R) -> Self {
        Self {
            inner,
            failure: None,
        }
    }

    fn take_failure(&mut self) -> Option<std::io::Error> {
        self.failure.take()
    }

    fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for FailureTracking<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf).map_err(|e| {
            let reported = std::io::Error::new(e.kind(), e.to_string());
            self.failure.get_or_insert(e);
            reported
        })
    }
}

fn column_index(schema: &Schema, name: &str) -> Option<usize> {
    schema
        .fields()
        .iter()
        .position(|field| field.name().trim() == name)
}

fn columns(batch: &RecordBatch) -> (&Float64Array, &UInt64Array) {
    (
        batch.column(0).as_primitive::<Float64Type>(),
        batch.column(1).as_primitive::<UInt64Type>(),
    )
}

/// Reject nulls and non-finite times, then rebuild the batch on the canonical
/// (non-null) schema.
///
/// `offset` is the number of records in preceding batches, so reported rows
/// are 1-based data rows of the whole file.
fn canonicalize(batch: &RecordBatch, offset: usize) -> std::result::Result<RecordBatch, String> {
    let (times, lens) = columns(batch);
    if let Some(row) = first_null(times) {
        return Err(format!(
            "row {}: missing value for '{TIME_RELATIVE_COLUMN}'",
            offset + row + 1
        ));
    }
    if let Some(row) = first_null(lens) {
        return Err(format!(
            "row {}: missing value for '{DATA_LEN_COLUMN}'",
            offset + row + 1
        ));
    }
    // Nulls are rejected above, so every slot here holds a parsed value
    if let Some(row) = times.values().iter().position(|t| !t.is_finite()) {
        return Err(format!(
            "row {}: non-finite value for '{TIME_RELATIVE_COLUMN}'",
            offset + row + 1
        ));
    }

    RecordBatch::try_new(
        capture_schema(),
        vec![batch.column(0).clone(), batch.column(1).clone()],
    )
    .map_err(|e| e.to_string())
}

fn first_null<T: ArrowPrimitiveType>(array: &PrimitiveArray<T>) -> Option<usize> {
    if array.null_count() == 0 {
        return None;
    }
    (0..array.len()).find(|&i| array.is_null(i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn malformed_detail(err: &Error) -> String {
        match err {
            Error::MalformedRecord { detail, .. } => detail.clone(),
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }

    #[test]
    fn test_load_csv_minimal_columns() {
        let file = write_csv("frame.time_relative,data.len\n0.1,50\n0.2,200\n0.3,50\n");
        let capture = Capture::load_csv(file.path()).unwrap();

        assert_eq!(capture.num_records(), 3);
        let records: Vec<_> = capture.records().collect();
        assert_eq!(records[0], CaptureRecord::new(0.1, 50));
        assert_eq!(records[1], CaptureRecord::new(0.2, 200));
        assert_eq!(records[2], CaptureRecord::new(0.3, 50));
        assert_eq!(capture.source(), file.path());
    }

    #[test]
    fn test_load_csv_tshark_export_with_quotes_and_extra_columns() {
        let file = write_csv(concat!(
            "\"frame.number\",\"frame.time_relative\",\"ip.src\",\"ip.dst\",\"data.len\"\n",
            "\"1\",\"0.000000000\",\"10.0.0.2\",\"10.0.0.1\",\"64\"\n",
            "\"2\",\"0.001002000\",\"10.0.0.1\",\"10.0.0.2\",\"1200\"\n",
        ));
        let capture = Capture::load_csv(file.path()).unwrap();

        let records: Vec<_> = capture.records().collect();
        assert_eq!(records.len(), 2);
        assert!((records[1].time_relative - 0.001_002).abs() < 1e-12);
        assert_eq!(records[1].data_len, 1200);
    }

    #[test]
    fn test_load_csv_column_order_independent() {
        let file = write_csv("data.len,frame.time_relative\n200,0.5\n");
        let capture = Capture::load_csv(file.path()).unwrap();

        let records: Vec<_> = capture.records().collect();
        assert_eq!(records, vec![CaptureRecord::new(0.5, 200)]);
    }

    #[test]
    fn test_load_csv_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.csv");

        let err = Capture::load_csv(&missing).unwrap_err();
        match err {
            Error::SourceUnavailable { path, .. } => assert_eq!(path, missing),
            other => panic!("expected SourceUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_load_csv_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_file = dir.path().join("simulated.csv");
        std::fs::create_dir(&not_a_file).unwrap();

        let err = Capture::load_csv(&not_a_file).unwrap_err();
        match err {
            Error::SourceUnavailable { path, .. } => assert_eq!(path, not_a_file),
            other => panic!("expected SourceUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_failure_tracking_keeps_io_error() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"))
            }
        }

        let mut reader = FailureTracking::new(Broken);
        let result = Format::default()
            .with_header(true)
            .infer_schema(&mut reader, Some(0));
        assert!(result.is_err());
        let failure = reader.take_failure().unwrap();
        assert_eq!(failure.kind(), std::io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_load_csv_non_finite_time_rejected() {
        for value in ["NaN", "inf", "-inf"] {
            let file = write_csv(&format!(
                "frame.time_relative,data.len\n0.1,5\n{value},5\n0.2,5\n"
            ));
            let err = Capture::load_csv(file.path()).unwrap_err();
            let detail = malformed_detail(&err);
            assert!(detail.contains("row 2"), "{value}: {detail}");
            assert!(detail.contains("non-finite"), "{value}: {detail}");
            assert!(detail.contains(TIME_RELATIVE_COLUMN), "{value}: {detail}");
        }
    }

    #[test]
    fn test_load_csv_non_finite_row_spans_batches() {
        let file = write_csv("frame.time_relative,data.len\n0.1,1\n0.2,2\n-inf,3\n");
        let err = Capture::load_csv_with_batch_size(file.path(), 2).unwrap_err();
        assert!(malformed_detail(&err).contains("row 3"));
    }

    #[test]
    fn test_load_csv_missing_required_column() {
        let file = write_csv("frame.time_relative,ip.src\n0.1,10.0.0.1\n");
        let err = Capture::load_csv(file.path()).unwrap_err();
        assert!(malformed_detail(&err).contains(DATA_LEN_COLUMN));
    }

    #[test]
    fn test_load_csv_non_numeric_value() {
        let file = write_csv("frame.time_relative,data.len\n0.1,50\nabc,50\n");
        let err = Capture::load_csv(file.path()).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { .. }));
    }

    #[test]
    fn test_load_csv_negative_length_rejected() {
        let file = write_csv("frame.time_relative,data.len\n0.1,-5\n");
        let err = Capture::load_csv(file.path()).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { .. }));
    }

    #[test]
    fn test_load_csv_missing_value_reports_row() {
        let file = write_csv("frame.time_relative,data.len\n0.1,50\n0.2,\n");
        let err = Capture::load_csv(file.path()).unwrap_err();
        let detail = malformed_detail(&err);
        assert!(detail.contains("row 2"), "{detail}");
        assert!(detail.contains(DATA_LEN_COLUMN), "{detail}");
    }

    #[test]
    fn test_load_csv_row_numbers_span_batches() {
        let file = write_csv("frame.time_relative,data.len\n0.1,1\n0.2,2\n0.3,3\n,4\n");
        let err = Capture::load_csv_with_batch_size(file.path(), 2).unwrap_err();
        assert!(malformed_detail(&err).contains("row 4"));
    }

    #[test]
    fn test_load_csv_preserves_order_across_batches() {
        let file = write_csv("frame.time_relative,data.len\n0.3,1\n0.1,2\n0.2,3\n0.4,4\n0.0,5\n");
        let capture = Capture::load_csv_with_batch_size(file.path(), 2).unwrap();

        assert_eq!(capture.batches().len(), 3);
        let times: Vec<f64> = capture.records().map(|r| r.time_relative).collect();
        assert_eq!(times, vec![0.3, 0.1, 0.2, 0.4, 0.0]);
    }

    #[test]
    fn test_load_csv_zero_byte_file_is_empty() {
        let file = write_csv("");
        let capture = Capture::load_csv(file.path()).unwrap();
        assert!(capture.is_empty());
        assert_eq!(capture.max_data_len(), None);
    }

    #[test]
    fn test_load_csv_header_only_is_empty() {
        let file = write_csv("frame.time_relative,data.len\n");
        let capture = Capture::load_csv(file.path()).unwrap();
        assert!(capture.is_empty());
    }

    #[test]
    fn test_max_data_len_across_batches() {
        let file = write_csv("frame.time_relative,data.len\n0.1,50\n0.2,70\n0.3,900\n0.4,10\n");
        let capture = Capture::load_csv_with_batch_size(file.path(), 2).unwrap();
        assert_eq!(capture.max_data_len(), Some(900));
    }

    #[test]
    fn test_append_batch_schema_validation() {
        let mut capture = Capture::from_records(&[CaptureRecord::new(0.0, 1)]).unwrap();

        let incompatible_schema = Schema::new(vec![Field::new("other", DataType::UInt64, false)]);
        let incompatible_batch = RecordBatch::try_new(
            Arc::new(incompatible_schema),
            vec![Arc::new(UInt64Array::from(vec![1, 2, 3]))],
        )
        .unwrap();

        let result = capture.append_batch(incompatible_batch);
        assert!(result.unwrap_err().to_string().contains("Schema mismatch"));
    }

    #[test]
    fn test_from_batches_accepts_canonical_schema() {
        let batch = RecordBatch::try_new(
            capture_schema(),
            vec![
                Arc::new(Float64Array::from(vec![0.5, 0.6])),
                Arc::new(UInt64Array::from(vec![10, 20])),
            ],
        )
        .unwrap();

        let capture = Capture::from_batches("run.csv", vec![batch.clone(), batch]).unwrap();
        assert_eq!(capture.num_records(), 4);
        assert_eq!(capture.source(), Path::new("run.csv"));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: the Arrow max kernel agrees with a row-wise scan
            #[test]
            fn prop_max_data_len_matches_records(
                lens in prop::collection::vec(0u64..2_000, 1..200)
            ) {
                let records: Vec<_> = lens
                    .iter()
                    .enumerate()
                    .map(|(i, &len)| CaptureRecord::new(i as f64 * 0.001, len))
                    .collect();
                let capture = Capture::from_records(&records).unwrap();

                prop_assert_eq!(capture.max_data_len(), lens.iter().copied().max());
                prop_assert_eq!(capture.records().count(), records.len());
            }
        }
    }
}
