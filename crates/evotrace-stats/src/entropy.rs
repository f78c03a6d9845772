//! Zero-order Shannon entropy of a byte buffer.

/// Byte-value histogram.
#[must_use]
pub fn histogram(data: &[u8]) -> [u64; 256] {
    let mut h = [0u64; 256];
    for &b in data {
        h[usize::from(b)] += 1;
    }
    h
}

/// Entropy in bits per byte, base 2, over the positive frequencies.
///
/// Empty input has entropy 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let n = data.len() as f64;
    histogram(data)
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_buffer_is_zero() {
        assert_eq!(shannon_entropy(&[0x3F; 4096]), 0.0);
        assert_eq!(shannon_entropy(&[]), 0.0);
    }

    #[test]
    fn all_byte_values_is_eight_bits() {
        let all: Vec<u8> = (0..=255).collect();
        assert!((shannon_entropy(&all) - 8.0).abs() < 1e-12);
    }

    #[test]
    fn two_symbols_is_one_bit() {
        assert!((shannon_entropy(b"abab") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn histogram_counts() {
        let h = histogram(&[1, 1, 2]);
        assert_eq!((h[1], h[2], h[0]), (2, 1, 0));
    }
}
