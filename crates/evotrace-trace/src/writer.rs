//! Encoder for the trace-log wire format (header + records).
//!
//! Mirrors what the runner's dump routine emits. The writer enforces the two
//! framing invariants the reader relies on: fixed program length and, for the
//! counted layout, a present `op_count`.

use crate::header::write_header;
use evotrace_core::{GenerationRecord, RecordLayout, TraceError, TraceHeader, TraceResult};
use std::io::Write;

/// Streaming trace encoder over any `Write`.
#[derive(Debug)]
pub struct TraceWriter<W: Write> {
    inner: W,
    layout: RecordLayout,
    program_len: usize,
    written: u64,
}

impl<W: Write> TraceWriter<W> {
    /// Write `header` immediately and prepare to append records in `layout`.
    pub fn new(mut inner: W, header: &TraceHeader, layout: RecordLayout) -> TraceResult<Self> {
        let program_len = header.program_len()?;
        write_header(&mut inner, header)?;
        Ok(Self {
            inner,
            layout,
            program_len,
            written: 0,
        })
    }

    /// Append one record.
    ///
    /// A plain-layout writer ignores `op_count`.
    pub fn write_record(&mut self, rec: &GenerationRecord) -> TraceResult<()> {
        if rec.program.len() != self.program_len {
            return Err(TraceError::ProgramLength {
                expected: self.program_len,
                actual: rec.program.len(),
            });
        }
        let op_count = match (self.layout.has_op_count(), rec.op_count) {
            (true, None) => {
                return Err(TraceError::MissingOpCount {
                    generation: rec.generation,
                })
            }
            (true, Some(ops)) => Some(ops),
            (false, _) => None,
        };
        self.inner.write_all(&rec.generation.to_le_bytes())?;
        if let Some(ops) = op_count {
            self.inner.write_all(&ops.to_le_bytes())?;
        }
        self.inner.write_all(&rec.program)?;
        self.written += 1;
        Ok(())
    }

    /// Records written so far.
    #[inline]
    #[must_use]
    pub const fn records_written(&self) -> u64 {
        self.written
    }

    /// Flush and give back the underlying sink.
    pub fn finish(mut self) -> TraceResult<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Encode a complete trace into memory.
pub fn encode_trace<'a, I>(
    header: &TraceHeader,
    layout: RecordLayout,
    records: I,
) -> TraceResult<Vec<u8>>
where
    I: IntoIterator<Item = &'a GenerationRecord>,
{
    let mut w = TraceWriter::new(Vec::new(), header, layout)?;
    for rec in records {
        w.write_record(rec)?;
    }
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(program_length: u64) -> TraceHeader {
        TraceHeader {
            program_length,
            ..TraceHeader::default()
        }
    }

    #[test]
    fn counted_record_bytes() {
        let rec = GenerationRecord::counted(0x0102, 0x0A, vec![0xEE, 0xFF]);
        let bytes = encode_trace(&header(2), RecordLayout::Counted, [&rec]).unwrap();
        assert_eq!(bytes.len(), 40 + 8 + 8 + 2);
        assert_eq!(&bytes[40..48], &0x0102u64.to_le_bytes());
        assert_eq!(&bytes[48..56], &0x0Au64.to_le_bytes());
        assert_eq!(&bytes[56..], &[0xEE, 0xFF]);
    }

    #[test]
    fn plain_ignores_op_count() {
        let rec = GenerationRecord::counted(5, 99, vec![1]);
        let bytes = encode_trace(&header(1), RecordLayout::Plain, [&rec]).unwrap();
        assert_eq!(bytes.len(), 40 + 8 + 1);
    }

    #[test]
    fn rejects_wrong_length() {
        let mut w = TraceWriter::new(Vec::new(), &header(4), RecordLayout::Plain).unwrap();
        let err = w
            .write_record(&GenerationRecord::plain(1, vec![0; 3]))
            .unwrap_err();
        assert!(matches!(
            err,
            TraceError::ProgramLength {
                expected: 4,
                actual: 3
            }
        ));
        assert_eq!(w.records_written(), 0);
    }

    #[test]
    fn counted_requires_op_count() {
        let mut w = TraceWriter::new(Vec::new(), &header(1), RecordLayout::Counted).unwrap();
        let err = w
            .write_record(&GenerationRecord::plain(3, vec![0]))
            .unwrap_err();
        assert!(matches!(err, TraceError::MissingOpCount { generation: 3 }));
        // Nothing of the rejected record reached the sink.
        assert_eq!(w.finish().unwrap().len(), 40);
    }
}
