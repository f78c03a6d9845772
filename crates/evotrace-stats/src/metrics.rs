//! Per-generation convergence signals.
//!
//! [`MetricsEngine::step`] is a pure function of the current record and, when
//! available, the one before it. It never fails: degenerate inputs produce
//! `None`/NaN fields and a `warn!` line instead.

use crate::compress::{Compressor, Zlib};
use crate::entropy::shannon_entropy;
use evotrace_core::{GenerationRecord, MetricsRow};
use tracing::warn;

/// Number of positions at which `a` and `b` differ.
///
/// `None` when the lengths differ; within one stream that cannot happen, so
/// it is logged.
#[must_use]
pub fn hamming(a: &[u8], b: &[u8]) -> Option<usize> {
    if a.len() != b.len() {
        warn!(
            prev_len = a.len(),
            curr_len = b.len(),
            "program lengths differ; skipping hamming distance"
        );
        return None;
    }
    Some(a.iter().zip(b).filter(|(x, y)| x != y).count())
}

/// Signed `curr - prev`, saturated to `i64`.
#[must_use]
pub fn signed_delta(curr: u64, prev: u64) -> i64 {
    let d = i128::from(curr) - i128::from(prev);
    i64::try_from(d).unwrap_or(if d < 0 { i64::MIN } else { i64::MAX })
}

/// Stateless metrics calculator parameterised by the compressor.
#[derive(Clone, Debug, Default)]
pub struct MetricsEngine<C = Zlib> {
    compressor: C,
}

impl MetricsEngine {
    /// zlib-backed engine at `level` (clamped to `0..=9`).
    #[must_use]
    pub fn zlib(level: u32) -> Self {
        Self::new(Zlib::new(level))
    }
}

impl<C: Compressor> MetricsEngine<C> {
    /// Engine using `compressor` for the compression ratio.
    pub const fn new(compressor: C) -> Self {
        Self { compressor }
    }

    /// Compressor in use.
    pub const fn compressor(&self) -> &C {
        &self.compressor
    }

    /// Compute the row for `curr`, diffing against `prev` when present.
    #[allow(clippy::cast_precision_loss)]
    pub fn step(&self, prev: Option<&GenerationRecord>, curr: &GenerationRecord) -> MetricsRow {
        let generation_delta = prev.map_or(0, |p| signed_delta(curr.generation, p.generation));

        let op_delta_rate = match (prev.and_then(|p| p.op_count), curr.op_count) {
            (Some(p_ops), Some(c_ops)) if generation_delta != 0 => {
                let ops = i128::from(c_ops) - i128::from(p_ops);
                Some(ops as f64 / generation_delta as f64)
            }
            _ => None,
        };

        let entropy_bits = shannon_entropy(&curr.program);

        let (compressed_bytes, compression_ratio_bits_per_byte) = if curr.program.is_empty() {
            (0, 0.0)
        } else {
            match self.compressor.compressed_len(&curr.program) {
                Ok(len) => (len, (len * 8) as f64 / curr.program.len() as f64),
                Err(e) => {
                    warn!(
                        generation = curr.generation,
                        compressor = self.compressor.name(),
                        error = %e,
                        "compression failed"
                    );
                    (0, f64::NAN)
                }
            }
        };

        let hamming_changes = prev.and_then(|p| hamming(&p.program, &curr.program));

        MetricsRow {
            generation: curr.generation,
            op_count: curr.op_count,
            generation_delta,
            op_delta_rate,
            compression_ratio_bits_per_byte,
            entropy_bits,
            entropy_minus_cratio: entropy_bits - compression_ratio_bits_per_byte,
            hamming_changes,
            compressed_bytes,
        }
    }
}
