//! Analysis configuration, loadable from TOML.
//!
//! ```toml
//! layout = "counted"
//! compression_level = 9
//! disassemble = false
//! repeats = true
//!
//! [settle]
//! max_compressed_bytes = 1000
//! min_generation = 1000
//! ```

use crate::compress::Zlib;
use crate::settle::SettleConfig;
use anyhow::{Context, Result};
use evotrace_core::RecordLayout;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Knobs for [`crate::Pipeline`]. Every field has a default.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Record framing of the input (not self-describing).
    pub layout: RecordLayout,
    /// zlib level for the compression ratio.
    pub compression_level: u32,
    /// Attach the packed-ISA instruction sequence to each row.
    pub disassemble: bool,
    /// Attach the longest repeated substring to each row.
    pub repeats: bool,
    /// Settle thresholds.
    pub settle: SettleConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            layout: RecordLayout::Counted,
            compression_level: Zlib::MAX_LEVEL,
            disassemble: false,
            repeats: false,
            settle: SettleConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse from a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parse analysis config")
    }

    /// Load from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)
            .with_context(|| format!("read config {}", p.to_string_lossy()))?;
        Self::from_toml_str(&s).with_context(|| format!("in {}", p.to_string_lossy()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(
            AnalysisConfig::from_toml_str("").unwrap(),
            AnalysisConfig::default()
        );
    }

    #[test]
    fn partial_override() {
        let c = AnalysisConfig::from_toml_str(
            "layout = \"plain\"\nrepeats = true\n[settle]\nmin_generation = 5\n",
        )
        .unwrap();
        assert_eq!(c.layout, RecordLayout::Plain);
        assert!(c.repeats);
        assert!(!c.disassemble);
        assert_eq!(c.compression_level, 9);
        assert_eq!(c.settle.min_generation, 5);
        assert_eq!(c.settle.max_compressed_bytes, 1000);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(AnalysisConfig::from_toml_str("layuot = \"plain\"").is_err());
    }

    #[test]
    fn unknown_settle_keys_are_rejected() {
        assert!(AnalysisConfig::from_toml_str("[settle]\nmin_generaton = 5\n").is_err());
        assert!(AnalysisConfig::from_toml_str("[settle]\nmin_generation = 5\n").is_ok());
    }
}
