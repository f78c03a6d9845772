//! Stream-level error taxonomy.
//!
//! End-of-stream is *not* an error: readers report it as `Ok(None)` (or the
//! end of an iterator). Everything here is fatal for the stream that raised it.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result alias for trace decoding/encoding.
pub type TraceResult<T> = Result<T, TraceError>;

/// Fixed-size field of a generation record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordField {
    /// Leading 8-byte generation counter.
    Generation,
    /// 8-byte op counter (counted layout).
    OpCount,
    /// `program_length` program bytes.
    Program,
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generation => f.write_str("generation"),
            Self::OpCount => f.write_str("op_count"),
            Self::Program => f.write_str("program"),
        }
    }
}

/// Errors raised while framing a trace stream.
#[derive(Debug, Error)]
pub enum TraceError {
    /// Fewer than 40 bytes before any record begins.
    #[error("truncated header: {available} of 40 bytes available")]
    TruncatedHeader {
        /// Bytes that could be read.
        available: usize,
    },

    /// A record started but one of its fixed-size fields ended early.
    #[error(
        "truncated record #{record_index} (after {record_index} complete records): \
         {field} field has {available} of {expected} bytes"
    )]
    TruncatedRecord {
        /// Zero-based index of the broken record (= records decoded before it).
        record_index: u64,
        /// Field that came up short.
        field: RecordField,
        /// Bytes required for the field.
        expected: usize,
        /// Bytes actually available.
        available: usize,
    },

    /// `program_length` cannot be addressed on this platform.
    #[error("program length {program_length} does not fit in memory on this platform")]
    ProgramTooLarge {
        /// Value read from the header.
        program_length: u64,
    },

    /// A record handed to the writer does not match the header's program length.
    #[error("program has {actual} bytes, header requires {expected}")]
    ProgramLength {
        /// Length required by the header.
        expected: usize,
        /// Length of the offending program.
        actual: usize,
    },

    /// A counted-layout writer was given a record without `op_count`.
    #[error("generation {generation}: counted layout requires op_count")]
    MissingOpCount {
        /// Generation of the offending record.
        generation: u64,
    },

    /// Underlying I/O failure other than a short read.
    #[error("trace i/o: {0}")]
    Io(#[from] io::Error),
}

impl TraceError {
    /// Number of records that decoded cleanly before this error, when known.
    #[must_use]
    pub const fn records_decoded(&self) -> Option<u64> {
        match self {
            Self::TruncatedRecord { record_index, .. } => Some(*record_index),
            Self::TruncatedHeader { .. } => Some(0),
            _ => None,
        }
    }

    /// Whether this error stems from an incomplete stream.
    #[must_use]
    pub const fn is_truncation(&self) -> bool {
        matches!(
            self,
            Self::TruncatedHeader { .. } | Self::TruncatedRecord { .. }
        )
    }
}
