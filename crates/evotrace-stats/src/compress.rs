//! Compressed-size oracle used for the compression-ratio metric.
//!
//! Only the compressed *length* matters, so encoders write into a counting
//! sink instead of materialising the output.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{self, Write};

/// Deterministic general-purpose compressor.
pub trait Compressor {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Size in bytes of `data` once compressed.
    fn compressed_len(&self, data: &[u8]) -> io::Result<usize>;
}

/// zlib (deflate + zlib framing) at a fixed level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Zlib {
    level: u32,
}

impl Zlib {
    /// Highest (and default) level.
    pub const MAX_LEVEL: u32 = 9;

    /// Compressor at `level`, clamped to `0..=9`.
    #[must_use]
    pub fn new(level: u32) -> Self {
        Self {
            level: level.min(Self::MAX_LEVEL),
        }
    }

    /// Effective level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }
}

impl Default for Zlib {
    fn default() -> Self {
        Self::new(Self::MAX_LEVEL)
    }
}

impl Compressor for Zlib {
    fn name(&self) -> &'static str {
        "zlib"
    }

    fn compressed_len(&self, data: &[u8]) -> io::Result<usize> {
        let mut enc = ZlibEncoder::new(ByteCounter::default(), Compression::new(self.level));
        enc.write_all(data)?;
        Ok(enc.finish()?.0)
    }
}

/// `Write` sink that only counts bytes.
#[derive(Debug, Default)]
struct ByteCounter(usize);

impl Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
