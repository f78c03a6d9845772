//! evotrace-stats: convergence analysis over trace logs.
//!
//! Pure building blocks ([`repeat`], [`entropy`], [`compress`], [`metrics`],
//! [`ngram`], [`settle`]) plus the streaming [`pipeline`] that composes them
//! over a [`evotrace_trace::reader::RecordReader`], and row [`sink`]s for
//! persisting the results.
//!
//! ```
//! use evotrace_stats::repeat::longest_repeated_substring;
//!
//! let r = longest_repeated_substring(b"abcabc");
//! assert_eq!(r.substring, b"abc");
//! assert_eq!(r.start_offset, 3);
//! ```

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
#![allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::doc_markdown
)]

pub mod compress;
pub mod config;
pub mod entropy;
pub mod metrics;
pub mod ngram;
pub mod pipeline;
pub mod repeat;
pub mod settle;
pub mod sink;

pub use config::AnalysisConfig;
pub use metrics::MetricsEngine;
pub use pipeline::{AnalysisRow, Pipeline, PipelineError, RunSummary};
