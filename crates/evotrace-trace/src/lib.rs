//! Streaming trace-log framing + synthetic trace generation.
//!
//! This crate provides the building blocks between a raw byte stream and the
//! typed records of `evotrace-core`:
//!
//! - `header`: read the fixed 40-byte preamble (`read_header`).
//! - `reader`: lazy, single-pass record iterator under an explicit layout.
//! - `writer`: the inverse framing (`TraceWriter`), used by tests and `synth`.
//! - `generator`: a deterministic toy runner for tests/benches.
//! - `io`: file-level open/create helpers with path-aware error context.
//!
//! Readers take any `std::io::Read`; nothing here seeks, so pipes and
//! in-memory slices work the same as files.
//!
//! We intentionally avoid broad re-exports so callers use stable paths like
//! `evotrace_trace::reader::RecordReader`.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

/// Deterministic toy runner producing synthetic generations.
pub mod generator;
/// Fixed preamble decoding.
pub mod header;
/// File open/create helpers (`anyhow` context).
pub mod io;
/// Lazy record iterator.
pub mod reader;
/// Header + record encoder.
pub mod writer;

mod wire;
