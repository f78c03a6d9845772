//! Lazy, single-pass generation-record reader.
//!
//! Framing per [`RecordLayout`]:
//!
//! ```text
//! plain   : generation:u64le | program[program_length]
//! counted : generation:u64le | op_count:u64le | program[program_length]
//! ```
//!
//! End-of-stream is only legal *before the first byte* of a record's
//! generation field. Any shortfall after that is a fatal
//! [`TraceError::TruncatedRecord`]; partial records are never yielded. After
//! the end or an error the reader is fused.

use crate::header::read_header;
use crate::wire::{read_exact_growing, read_up_to};
use evotrace_core::{
    GenerationRecord, RecordField, RecordLayout, TraceError, TraceHeader, TraceResult, WORD_LEN,
};
use std::io::Read;
use std::iter::FusedIterator;
use tracing::{debug, trace};

/// Owning record iterator over any `Read`.
///
/// Holds no history: each call decodes exactly one record. Use
/// [`RecordReader::next_into`] to recycle program buffers.
#[derive(Debug)]
pub struct RecordReader<R> {
    inner: R,
    header: TraceHeader,
    layout: RecordLayout,
    program_len: usize,
    decoded: u64,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    /// Read the preamble from `inner`, then frame records with `layout`.
    pub fn open(mut inner: R, layout: RecordLayout) -> TraceResult<Self> {
        let header = read_header(&mut inner)?;
        Self::with_header(inner, header, layout)
    }

    /// Frame records from a stream whose header was already consumed.
    pub fn with_header(inner: R, header: TraceHeader, layout: RecordLayout) -> TraceResult<Self> {
        let program_len = header.program_len()?;
        debug!(%layout, program_len, "record reader ready");
        Ok(Self {
            inner,
            header,
            layout,
            program_len,
            decoded: 0,
            done: false,
        })
    }

    /// Header governing this stream.
    #[inline]
    #[must_use]
    pub const fn header(&self) -> &TraceHeader {
        &self.header
    }

    /// Layout the reader was configured with.
    #[inline]
    #[must_use]
    pub const fn layout(&self) -> RecordLayout {
        self.layout
    }

    /// Records decoded so far.
    #[inline]
    #[must_use]
    pub const fn records_decoded(&self) -> u64 {
        self.decoded
    }

    /// Give back the underlying stream.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Decode the next record into `rec`, reusing its program allocation.
    ///
    /// Returns `Ok(false)` on a clean end-of-stream. On error `rec` holds
    /// unspecified partial data and must not be used.
    pub fn next_into(&mut self, rec: &mut GenerationRecord) -> TraceResult<bool> {
        if self.done {
            return Ok(false);
        }
        let res = self.read_one(rec);
        match res {
            Ok(true) => self.decoded += 1,
            Ok(false) | Err(_) => self.done = true,
        }
        res
    }

    /// Decode the next record into a fresh allocation.
    pub fn next_record(&mut self) -> TraceResult<Option<GenerationRecord>> {
        let mut rec = GenerationRecord {
            program: Vec::with_capacity(self.program_len.min(MAX_PREALLOC)),
            ..GenerationRecord::default()
        };
        Ok(self.next_into(&mut rec)?.then_some(rec))
    }

    fn read_one(&mut self, rec: &mut GenerationRecord) -> TraceResult<bool> {
        let mut word = [0u8; WORD_LEN];

        let n = read_up_to(&mut self.inner, &mut word)?;
        if n == 0 {
            trace!(records = self.decoded, "end of stream");
            return Ok(false);
        }
        if n < WORD_LEN {
            return Err(self.truncated(RecordField::Generation, WORD_LEN, n));
        }
        rec.generation = u64::from_le_bytes(word);

        rec.op_count = if self.layout.has_op_count() {
            let n = read_up_to(&mut self.inner, &mut word)?;
            if n < WORD_LEN {
                return Err(self.truncated(RecordField::OpCount, WORD_LEN, n));
            }
            Some(u64::from_le_bytes(word))
        } else {
            None
        };

        rec.program.clear();
        let got = read_exact_growing(&mut self.inner, self.program_len, &mut rec.program)?;
        if got < self.program_len {
            return Err(self.truncated(RecordField::Program, self.program_len, got));
        }

        trace!(generation = rec.generation, op_count = ?rec.op_count, "decoded record");
        Ok(true)
    }

    fn truncated(&self, field: RecordField, expected: usize, available: usize) -> TraceError {
        TraceError::TruncatedRecord {
            record_index: self.decoded,
            field,
            expected,
            available,
        }
    }
}

/// Upper bound on eager program-buffer reservation (bytes).
const MAX_PREALLOC: usize = 1 << 20;

impl<R: Read> Iterator for RecordReader<R> {
    type Item = TraceResult<GenerationRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

impl<R: Read> FusedIterator for RecordReader<R> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(program_length: u64) -> TraceHeader {
        TraceHeader {
            program_length,
            ..TraceHeader::default()
        }
    }

    fn stream(h: &TraceHeader, body: &[u8]) -> Vec<u8> {
        let mut v = h.to_bytes().to_vec();
        v.extend_from_slice(body);
        v
    }

    #[test]
    fn plain_layout_two_records() {
        let mut body = Vec::new();
        body.extend_from_slice(&7u64.to_le_bytes());
        body.extend_from_slice(&[1, 2, 3]);
        body.extend_from_slice(&9u64.to_le_bytes());
        body.extend_from_slice(&[4, 5, 6]);
        let bytes = stream(&header(3), &body);

        let rdr = RecordReader::open(bytes.as_slice(), RecordLayout::Plain).unwrap();
        let recs: Vec<_> = rdr.collect::<TraceResult<_>>().unwrap();
        assert_eq!(
            recs,
            vec![
                GenerationRecord::plain(7, vec![1, 2, 3]),
                GenerationRecord::plain(9, vec![4, 5, 6]),
            ]
        );
    }

    #[test]
    fn counted_layout_reads_op_count() {
        let mut body = Vec::new();
        body.extend_from_slice(&1u64.to_le_bytes());
        body.extend_from_slice(&500u64.to_le_bytes());
        body.extend_from_slice(&[0x20, 0x21]);
        let bytes = stream(&header(2), &body);

        let mut rdr = RecordReader::open(bytes.as_slice(), RecordLayout::Counted).unwrap();
        let rec = rdr.next_record().unwrap().unwrap();
        assert_eq!(rec, GenerationRecord::counted(1, 500, vec![0x20, 0x21]));
        assert!(rdr.next_record().unwrap().is_none());
        assert_eq!(rdr.records_decoded(), 1);
    }

    #[test]
    fn header_only_is_empty_stream() {
        let bytes = stream(&header(16), &[]);
        let mut rdr = RecordReader::open(bytes.as_slice(), RecordLayout::Counted).unwrap();
        assert!(rdr.next().is_none());
    }

    #[test]
    fn zero_length_programs() {
        let mut body = Vec::new();
        body.extend_from_slice(&1u64.to_le_bytes());
        body.extend_from_slice(&2u64.to_le_bytes());
        let bytes = stream(&header(0), &body);
        let recs: Vec<_> = RecordReader::open(bytes.as_slice(), RecordLayout::Plain)
            .unwrap()
            .collect::<TraceResult<_>>()
            .unwrap();
        assert_eq!(recs.len(), 2);
        assert!(recs.iter().all(|r| r.program.is_empty()));
    }

    #[test]
    fn partial_generation_is_truncation() {
        let bytes = stream(&header(1), &[1, 2, 3]);
        let mut rdr = RecordReader::open(bytes.as_slice(), RecordLayout::Plain).unwrap();
        match rdr.next() {
            Some(Err(TraceError::TruncatedRecord {
                record_index: 0,
                field: RecordField::Generation,
                expected: 8,
                available: 3,
            })) => {}
            other => panic!("unexpected {other:?}"),
        }
        assert!(rdr.next().is_none(), "fused after error");
    }

    #[test]
    fn short_program_reports_index() {
        let mut body = Vec::new();
        body.extend_from_slice(&1u64.to_le_bytes());
        body.extend_from_slice(&[1, 1, 1, 1]);
        body.extend_from_slice(&2u64.to_le_bytes());
        body.extend_from_slice(&[2, 2]);
        let bytes = stream(&header(4), &body);
        let mut rdr = RecordReader::open(bytes.as_slice(), RecordLayout::Plain).unwrap();
        assert!(rdr.next().unwrap().is_ok());
        let err = rdr.next().unwrap().unwrap_err();
        assert_eq!(err.records_decoded(), Some(1));
        assert!(matches!(
            err,
            TraceError::TruncatedRecord {
                field: RecordField::Program,
                expected: 4,
                available: 2,
                ..
            }
        ));
    }

    #[test]
    fn huge_program_length_does_not_preallocate() {
        // A corrupt header must surface as truncation, not as an allocation abort.
        let mut body = Vec::new();
        body.extend_from_slice(&1u64.to_le_bytes());
        body.extend_from_slice(&[0u8; 10]);
        let h = header(u64::from(u32::MAX));
        let bytes = stream(&h, &body);
        let mut rdr = RecordReader::open(bytes.as_slice(), RecordLayout::Plain).unwrap();
        let err = rdr.next().unwrap().unwrap_err();
        assert!(err.is_truncation());
    }

    #[test]
    fn next_into_reuses_buffer() {
        let mut body = Vec::new();
        for g in 0..3u64 {
            body.extend_from_slice(&g.to_le_bytes());
            body.extend_from_slice(&[g as u8; 8]);
        }
        let bytes = stream(&header(8), &body);
        let mut rdr = RecordReader::open(bytes.as_slice(), RecordLayout::Plain).unwrap();
        let mut rec = GenerationRecord::default();
        let mut seen = Vec::new();
        while rdr.next_into(&mut rec).unwrap() {
            seen.push((rec.generation, rec.program[0]));
        }
        assert_eq!(seen, vec![(0, 0), (1, 1), (2, 2)]);
    }
}
