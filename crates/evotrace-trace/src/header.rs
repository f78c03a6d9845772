//! Fixed 40-byte preamble of a trace log.
//!
//! Five little-endian `u64`s in order: program length, segment length,
//! iteration limit, mutation rate, runner count. Values are opaque here;
//! `program_length == 0` is legal and frames empty programs.

use crate::wire::read_up_to;
use evotrace_core::{TraceError, TraceHeader, TraceResult, HEADER_LEN};
use std::io::{Read, Write};
use tracing::debug;

/// Read exactly 40 bytes and decode them into a [`TraceHeader`].
///
/// # Errors
/// [`TraceError::TruncatedHeader`] if the stream holds fewer than 40 bytes,
/// [`TraceError::Io`] on any other read failure.
pub fn read_header<R: Read + ?Sized>(r: &mut R) -> TraceResult<TraceHeader> {
    let mut raw = [0u8; HEADER_LEN];
    let available = read_up_to(r, &mut raw)?;
    if available < HEADER_LEN {
        return Err(TraceError::TruncatedHeader { available });
    }
    let header = TraceHeader::from_bytes(&raw);
    debug!(
        program_length = header.program_length,
        segment_length = header.segment_length,
        iteration_limit = header.iteration_limit,
        mutation_rate = header.mutation_rate,
        runner_count = header.runner_count,
        "read trace header"
    );
    Ok(header)
}

/// Write the 40-byte preamble.
pub fn write_header<W: Write + ?Sized>(w: &mut W, header: &TraceHeader) -> TraceResult<()> {
    w.write_all(&header.to_bytes())?;
    Ok(())
}
