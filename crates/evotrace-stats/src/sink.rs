//! Row sinks: CSV, JSON Lines and CBOR sequences.
//!
//! The format is picked from the output extension (case-insensitive):
//! `.csv`, `.jsonl` / `.ndjson`, `.cbor`. Anything else is rejected.

use crate::pipeline::AnalysisRow;
use anyhow::{anyhow, Context, Result};
use evotrace_core::MetricsRow;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// CSV column names, in order.
pub const CSV_HEADER: &str =
    "generation,op_count,delta_gen,rate,cratio,entropy,entropy_minus_cratio,changes,compressed_bytes";

/// Output encoding for rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowFormat {
    /// Comma-separated metrics only; missing values are empty cells.
    Csv,
    /// One JSON object per line.
    Jsonl,
    /// Concatenated CBOR items.
    Cbor,
}

impl RowFormat {
    /// Format implied by `path`'s extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match ext_lower(path).as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("jsonl" | "ndjson") => Ok(Self::Jsonl),
            Some("cbor") => Ok(Self::Cbor),
            Some(other) => Err(anyhow!(
                "unsupported output extension: {other} (supported: .csv, .jsonl, .ndjson, .cbor)"
            )),
            None => Err(anyhow!(
                "output path has no extension (expected .csv, .jsonl, .ndjson or .cbor)"
            )),
        }
    }
}

/// Destination for analysis rows.
pub trait RowSink {
    /// Append one row.
    fn write_row(&mut self, row: &AnalysisRow) -> Result<()>;

    /// Flush buffered output.
    fn finish(&mut self) -> Result<()>;
}

/// CSV writer; emits the header before the first row.
#[derive(Debug)]
pub struct CsvSink<W: Write> {
    w: W,
    started: bool,
}

impl<W: Write> CsvSink<W> {
    /// Wrap `w`.
    pub const fn new(w: W) -> Self {
        Self { w, started: false }
    }

    fn start(&mut self) -> Result<()> {
        if !self.started {
            writeln!(self.w, "{CSV_HEADER}").context("write csv header")?;
            self.started = true;
        }
        Ok(())
    }
}

fn cell<T: Display>(v: Option<T>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

/// One CSV line (without newline) for `m`.
#[must_use]
pub fn csv_line(m: &MetricsRow) -> String {
    format!(
        "{},{},{},{},{},{},{},{},{}",
        m.generation,
        cell(m.op_count),
        m.generation_delta,
        cell(m.op_delta_rate),
        m.compression_ratio_bits_per_byte,
        m.entropy_bits,
        m.entropy_minus_cratio,
        cell(m.hamming_changes),
        m.compressed_bytes,
    )
}

impl<W: Write> RowSink for CsvSink<W> {
    fn write_row(&mut self, row: &AnalysisRow) -> Result<()> {
        self.start()?;
        writeln!(self.w, "{}", csv_line(&row.metrics)).context("write csv row")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.start()?;
        self.w.flush().context("flush csv writer")
    }
}

/// JSON Lines writer.
#[derive(Debug)]
pub struct JsonlSink<W: Write> {
    w: W,
}

impl<W: Write> JsonlSink<W> {
    /// Wrap `w`.
    pub const fn new(w: W) -> Self {
        Self { w }
    }
}

impl<W: Write> RowSink for JsonlSink<W> {
    fn write_row(&mut self, row: &AnalysisRow) -> Result<()> {
        serde_json::to_writer(&mut self.w, row).context("serialize row to json")?;
        self.w.write_all(b"\n").context("write jsonl newline")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.w.flush().context("flush jsonl writer")
    }
}

/// CBOR sequence writer (one item per row, no framing).
#[derive(Debug)]
pub struct CborSeqSink<W: Write> {
    w: W,
}

impl<W: Write> CborSeqSink<W> {
    /// Wrap `w`.
    pub const fn new(w: W) -> Self {
        Self { w }
    }
}

impl<W: Write> RowSink for CborSeqSink<W> {
    fn write_row(&mut self, row: &AnalysisRow) -> Result<()> {
        ciborium::ser::into_writer(row, &mut self.w).context("serialize row to cbor")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.w.flush().context("flush cbor writer")
    }
}

/// Sink over `w` in `format`.
pub fn sink_for<'w, W: Write + 'w>(w: W, format: RowFormat) -> Box<dyn RowSink + 'w> {
    match format {
        RowFormat::Csv => Box::new(CsvSink::new(w)),
        RowFormat::Jsonl => Box::new(JsonlSink::new(w)),
        RowFormat::Cbor => Box::new(CborSeqSink::new(w)),
    }
}

/// Create `path` and return a buffered sink chosen by its extension.
pub fn create_sink<P: AsRef<Path>>(path: P) -> Result<Box<dyn RowSink>> {
    let path_ref = path.as_ref();
    let format = RowFormat::from_path(path_ref)?;
    evotrace_trace::io::ensure_parent_dir(path_ref)?;
    let f = File::create(path_ref)
        .with_context(|| format!("create {}", path_ref.to_string_lossy()))?;
    Ok(sink_for(BufWriter::new(f), format))
}

#[inline]
fn ext_lower(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}
