//! File-level helpers for trace logs.
//!
//! These routines only move bytes between paths and the framing types; they
//! add path-aware `anyhow` context so CLI/harness errors name the file.

use crate::generator::{generate_trace, SynthParams};
use crate::reader::RecordReader;
use crate::writer::TraceWriter;
use anyhow::{Context, Result};
use evotrace_core::RecordLayout;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Open a trace file and read its header.
pub fn open_trace<P: AsRef<Path>>(
    path: P,
    layout: RecordLayout,
) -> Result<RecordReader<BufReader<File>>> {
    let path_ref = path.as_ref();
    let f = File::open(path_ref).with_context(|| format!("open {}", display(path_ref)))?;
    RecordReader::open(BufReader::new(f), layout)
        .with_context(|| format!("read header of {}", display(path_ref)))
}

/// Create (truncate) a trace file and write its header.
pub fn create_trace<P: AsRef<Path>>(
    path: P,
    header: &evotrace_core::TraceHeader,
    layout: RecordLayout,
) -> Result<TraceWriter<BufWriter<File>>> {
    let path_ref = path.as_ref();
    ensure_parent_dir(path_ref)?;
    let f = File::create(path_ref).with_context(|| format!("create {}", display(path_ref)))?;
    TraceWriter::new(BufWriter::new(f), header, layout)
        .with_context(|| format!("write header to {}", display(path_ref)))
}

/// Write a synthetic trace to `path`; returns the number of records written.
pub fn write_synthetic_trace<P: AsRef<Path>>(
    path: P,
    params: SynthParams,
    layout: RecordLayout,
) -> Result<u64> {
    let path_ref = path.as_ref();
    let mut w = create_trace(path_ref, &params.header(), layout)?;
    for rec in generate_trace(params, layout) {
        w.write_record(&rec)
            .with_context(|| format!("write generation {}", rec.generation))?;
    }
    let n = w.records_written();
    w.finish()
        .with_context(|| format!("flush {}", display(path_ref)))?;
    Ok(n)
}

/// Ensure the parent directory for a file exists (no-op if none).
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating parent directory {}", display(path)))?;
        }
    }
    Ok(())
}

#[inline]
fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
