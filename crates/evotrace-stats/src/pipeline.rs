//! Streaming analysis cursor: `RecordReader` → metrics (+ optional
//! disassembly and repeat search) → one [`AnalysisRow`] per record.
//!
//! Memory stays at two program-sized buffers regardless of stream length: the
//! reader decodes into `curr`, the row is computed against `prev`, then the
//! two are swapped.

use crate::config::AnalysisConfig;
use crate::metrics::MetricsEngine;
use crate::repeat::longest_repeated_substring;
use crate::settle::SettleDetector;
use evotrace_core::isa::disassemble_packed;
use evotrace_core::{
    GenerationRecord, Instruction, MetricsRow, RepeatResult, TraceError, TraceHeader,
};
use evotrace_trace::reader::RecordReader;
use serde::Serialize;
use std::io::Read;
use std::iter::FusedIterator;
use thiserror::Error;
use tracing::{debug, info};

/// Everything computed for one generation record.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct AnalysisRow {
    /// Convergence signals.
    #[serde(flatten)]
    pub metrics: MetricsRow,
    /// Packed-ISA disassembly, when enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Vec<Instruction>>,
    /// Longest repeated substring, when enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<RepeatResult>,
}

/// Outcome of a complete run.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct RunSummary {
    /// Stream header.
    pub header: TraceHeader,
    /// Records analysed.
    pub records: u64,
    /// First settled generation, if any.
    pub settled_at: Option<u64>,
}

/// What stopped the pipeline.
#[derive(Debug, Error)]
pub enum PipelineErrorKind {
    /// The trace stream was truncated or unreadable.
    #[error(transparent)]
    Trace(#[from] TraceError),
    /// The row consumer passed to [`Pipeline::run`] failed.
    #[error("row consumer failed: {0:#}")]
    Consumer(anyhow::Error),
}

/// Fatal pipeline failure, tagged with the rows emitted before it.
#[derive(Debug, Error)]
#[error("analysis aborted after {rows_emitted} rows: {kind}")]
pub struct PipelineError {
    /// Rows fully produced before the failure.
    pub rows_emitted: u64,
    /// Cause.
    pub kind: PipelineErrorKind,
}

impl PipelineError {
    /// Underlying trace error, if the stream was at fault.
    #[must_use]
    pub const fn trace_error(&self) -> Option<&TraceError> {
        match &self.kind {
            PipelineErrorKind::Trace(e) => Some(e),
            PipelineErrorKind::Consumer(_) => None,
        }
    }
}

/// Single-pass analysis cursor over one trace stream.
#[derive(Debug)]
pub struct Pipeline<R> {
    reader: RecordReader<R>,
    cfg: AnalysisConfig,
    engine: MetricsEngine,
    settle: SettleDetector,
    prev: GenerationRecord,
    curr: GenerationRecord,
    have_prev: bool,
    emitted: u64,
}

impl<R: Read> Pipeline<R> {
    /// Read the header from `inner` and start a cursor with `cfg.layout`.
    pub fn open(inner: R, cfg: AnalysisConfig) -> Result<Self, PipelineError> {
        let reader = RecordReader::open(inner, cfg.layout).map_err(|e| PipelineError {
            rows_emitted: 0,
            kind: e.into(),
        })?;
        Ok(Self::new(reader, cfg))
    }

    /// Wrap an already-open reader. `cfg.layout` is ignored in favour of the
    /// reader's.
    pub fn new(reader: RecordReader<R>, cfg: AnalysisConfig) -> Self {
        debug!(?cfg, header = ?reader.header(), "pipeline ready");
        Self {
            engine: MetricsEngine::zlib(cfg.compression_level),
            settle: SettleDetector::new(cfg.settle),
            reader,
            cfg,
            prev: GenerationRecord::default(),
            curr: GenerationRecord::default(),
            have_prev: false,
            emitted: 0,
        }
    }

    /// Stream header.
    pub const fn header(&self) -> &TraceHeader {
        self.reader.header()
    }

    /// Rows produced so far.
    pub const fn rows_emitted(&self) -> u64 {
        self.emitted
    }

    /// First settled generation seen so far.
    pub const fn settled_at(&self) -> Option<u64> {
        self.settle.settled_at()
    }

    /// Analyse the next record; `Ok(None)` at a clean end of stream.
    pub fn next_row(&mut self) -> Result<Option<AnalysisRow>, PipelineError> {
        let more = self
            .reader
            .next_into(&mut self.curr)
            .map_err(|e| self.fail(e.into()))?;
        if !more {
            return Ok(None);
        }

        let prev = self.have_prev.then_some(&self.prev);
        let metrics = self.engine.step(prev, &self.curr);
        self.settle.observe(&metrics);
        let instructions = self
            .cfg
            .disassemble
            .then(|| disassemble_packed(&self.curr.program));
        let repeat = self
            .cfg
            .repeats
            .then(|| longest_repeated_substring(&self.curr.program));

        std::mem::swap(&mut self.prev, &mut self.curr);
        self.have_prev = true;
        self.emitted += 1;

        Ok(Some(AnalysisRow {
            metrics,
            instructions,
            repeat,
        }))
    }

    /// Drive the cursor to the end, handing each row to `on_row`.
    pub fn run<F>(mut self, mut on_row: F) -> Result<RunSummary, PipelineError>
    where
        F: FnMut(AnalysisRow) -> anyhow::Result<()>,
    {
        while let Some(row) = self.next_row()? {
            on_row(row).map_err(|e| self.fail(PipelineErrorKind::Consumer(e)))?;
        }
        let summary = RunSummary {
            header: *self.header(),
            records: self.emitted,
            settled_at: self.settled_at(),
        };
        info!(
            records = summary.records,
            settled_at = ?summary.settled_at,
            "analysis complete"
        );
        Ok(summary)
    }

    fn fail(&self, kind: PipelineErrorKind) -> PipelineError {
        PipelineError {
            rows_emitted: self.emitted,
            kind,
        }
    }
}

impl<R: Read> Iterator for Pipeline<R> {
    type Item = Result<AnalysisRow, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

impl<R: Read> FusedIterator for Pipeline<R> {}
