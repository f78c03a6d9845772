//! Canonical trace types used across the evotrace workspace.
//!
//! These live in `evotrace-core` and are re-exported at the crate root so other
//! crates can import via `evotrace_core::TraceHeader`, `evotrace_core::MetricsRow`, etc.
//!
//! Serialized forms are conservative and portable (serde); the *wire* framing of
//! the binary trace log is handled by `evotrace-trace`, not by serde.

use crate::error::{TraceError, TraceResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of every integer field on the wire (little-endian `u64`).
pub const WORD_LEN: usize = 8;

/// Number of `u64` fields in the fixed preamble.
pub const HEADER_FIELDS: usize = 5;

/// Byte length of the fixed preamble.
pub const HEADER_LEN: usize = WORD_LEN * HEADER_FIELDS;

/// Fixed 40-byte preamble of a trace log.
///
/// Field values are opaque to the decoder; only `program_length` affects framing.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TraceHeader {
    /// Bytes per program (ULEN).
    pub program_length: u64,
    /// Runner stack length (SLEN).
    pub segment_length: u64,
    /// Per-run iteration cap (ILIMIT).
    pub iteration_limit: u64,
    /// Mutation period of the runner (higher is less mutation).
    pub mutation_rate: u64,
    /// Number of concurrent runners.
    pub runner_count: u64,
}

impl TraceHeader {
    /// Decode the preamble from its fixed 40-byte form.
    #[must_use]
    pub fn from_bytes(raw: &[u8; HEADER_LEN]) -> Self {
        let mut words = [0u64; HEADER_FIELDS];
        for (w, chunk) in words.iter_mut().zip(raw.chunks_exact(WORD_LEN)) {
            let mut le = [0u8; WORD_LEN];
            le.copy_from_slice(chunk);
            *w = u64::from_le_bytes(le);
        }
        let [program_length, segment_length, iteration_limit, mutation_rate, runner_count] =
            words;
        Self {
            program_length,
            segment_length,
            iteration_limit,
            mutation_rate,
            runner_count,
        }
    }

    /// Encode the preamble into its fixed 40-byte form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        let words = [
            self.program_length,
            self.segment_length,
            self.iteration_limit,
            self.mutation_rate,
            self.runner_count,
        ];
        for (chunk, w) in out.chunks_exact_mut(WORD_LEN).zip(words) {
            chunk.copy_from_slice(&w.to_le_bytes());
        }
        out
    }

    /// `program_length` as `usize`.
    ///
    /// Fails with [`TraceError::ProgramTooLarge`] when the value cannot be
    /// addressed on this platform.
    pub fn program_len(&self) -> TraceResult<usize> {
        usize::try_from(self.program_length).map_err(|_| TraceError::ProgramTooLarge {
            program_length: self.program_length,
        })
    }
}

/// Record framing used by the producer of a trace.
///
/// The layout is **not** self-describing in the byte stream; callers must
/// know which producer emitted the file and pass it explicitly.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecordLayout {
    /// Layout A: `generation` then `program_length` bytes.
    #[serde(alias = "a")]
    Plain,
    /// Layout B: `generation`, `op_count`, then `program_length` bytes.
    #[default]
    #[serde(alias = "b")]
    Counted,
}

impl RecordLayout {
    /// Whether records carry an `op_count` field.
    #[inline]
    #[must_use]
    pub const fn has_op_count(self) -> bool {
        matches!(self, Self::Counted)
    }

    /// Fixed bytes preceding the program in each record.
    #[inline]
    #[must_use]
    pub const fn prefix_len(self) -> usize {
        match self {
            Self::Plain => WORD_LEN,
            Self::Counted => 2 * WORD_LEN,
        }
    }

    /// Total on-wire size of one record for a program of `program_len` bytes.
    #[inline]
    #[must_use]
    pub const fn record_len(self, program_len: usize) -> usize {
        self.prefix_len() + program_len
    }
}

impl fmt::Display for RecordLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => f.write_str("plain"),
            Self::Counted => f.write_str("counted"),
        }
    }
}

/// One generation snapshot within a trace log.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationRecord {
    /// Generation counter as written by the runner (not interpreted).
    pub generation: u64,
    /// Cumulative executed-op counter (counted layout only).
    pub op_count: Option<u64>,
    /// Program bytes, exactly `program_length` long.
    pub program: Vec<u8>,
}

impl GenerationRecord {
    /// Record as framed by the plain layout.
    #[inline]
    #[must_use]
    pub const fn plain(generation: u64, program: Vec<u8>) -> Self {
        Self {
            generation,
            op_count: None,
            program,
        }
    }

    /// Record as framed by the counted layout.
    #[inline]
    #[must_use]
    pub const fn counted(generation: u64, op_count: u64, program: Vec<u8>) -> Self {
        Self {
            generation,
            op_count: Some(op_count),
            program,
        }
    }
}

/// Longest repeated substring of a buffer (see `evotrace_stats::repeat`).
///
/// An empty `substring` (length 0) means no repetition longer than one byte
/// was found.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepeatResult {
    /// The repeated bytes.
    pub substring: Vec<u8>,
    /// Offset of the occurrence the substring was extracted from.
    pub start_offset: usize,
    /// `substring.len()`.
    pub length: usize,
}

impl RepeatResult {
    /// The "nothing repeats" result.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            substring: Vec::new(),
            start_offset: 0,
            length: 0,
        }
    }

    /// Whether no qualifying repetition was found.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// Per-generation convergence signals.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MetricsRow {
    /// Generation of the current record.
    pub generation: u64,
    /// `op_count` of the current record, if the layout carries it.
    pub op_count: Option<u64>,
    /// `curr.generation - prev.generation` (0 without a previous record).
    pub generation_delta: i64,
    /// Ops executed per generation since the previous record.
    ///
    /// `None` when either record lacks `op_count` or the delta is zero.
    pub op_delta_rate: Option<f64>,
    /// Compressed size in bits per original byte.
    pub compression_ratio_bits_per_byte: f64,
    /// Zero-order Shannon entropy of the program bytes, in bits.
    pub entropy_bits: f64,
    /// `entropy_bits - compression_ratio_bits_per_byte`.
    pub entropy_minus_cratio: f64,
    /// Byte positions that changed since the previous record.
    pub hamming_changes: Option<usize>,
    /// Compressed program size in bytes.
    pub compressed_bytes: usize,
}
