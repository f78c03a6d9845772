//! "Settled" detection: the first generation whose program has become
//! compressible enough after a warm-up period.

use evotrace_core::MetricsRow;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Thresholds for [`SettleDetector`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SettleConfig {
    /// Compressed size must be strictly below this many bytes.
    pub max_compressed_bytes: usize,
    /// Generation must be strictly above this value.
    pub min_generation: u64,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            max_compressed_bytes: 1000,
            min_generation: 1000,
        }
    }
}

/// Latches the first row meeting both thresholds.
#[derive(Clone, Copy, Debug, Default)]
pub struct SettleDetector {
    cfg: SettleConfig,
    settled_at: Option<u64>,
}

impl SettleDetector {
    /// Fresh detector.
    #[must_use]
    pub const fn new(cfg: SettleConfig) -> Self {
        Self {
            cfg,
            settled_at: None,
        }
    }

    /// Feed one row; returns the generation only on the row that settles.
    pub fn observe(&mut self, row: &MetricsRow) -> Option<u64> {
        if self.settled_at.is_some() {
            return None;
        }
        let compressed_ok = row.compressed_bytes < self.cfg.max_compressed_bytes
            && !row.compression_ratio_bits_per_byte.is_nan();
        if compressed_ok && row.generation > self.cfg.min_generation {
            info!(
                generation = row.generation,
                compressed_bytes = row.compressed_bytes,
                "program settled"
            );
            self.settled_at = Some(row.generation);
            return self.settled_at;
        }
        None
    }

    /// Generation at which the stream settled, if it has.
    #[must_use]
    pub const fn settled_at(&self) -> Option<u64> {
        self.settled_at
    }
}
