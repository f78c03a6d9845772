//! Instruction-shape n-gram census over a packed program.
//!
//! The census alphabet folds instructions by opcode class: every push is `P`,
//! every shift-push is `S`, and all NOP bytes share a space. Immediates are
//! ignored, so the census groups shapes rather than raw bytes or glyphs.

use evotrace_core::isa::{decode_byte, Instruction};
use std::collections::HashMap;

/// Maximum number of entries the runner's census prints.
pub const DEFAULT_LIMIT: usize = 8;

/// Census character for one opcode byte.
///
/// | class       | char |
/// |-------------|------|
/// | `Push`      | `P`  |
/// | `ShiftPush` | `S`  |
/// | `Copy`      | `C`  |
/// | `Inc`       | `>`  |
/// | `Dec`       | `<`  |
/// | `Jnz`       | `J`  |
/// | `Nop`       | ` `  |
#[must_use]
pub const fn census_char(op: u8) -> char {
    match decode_byte(op) {
        Instruction::Push(_) => 'P',
        Instruction::ShiftPush(_) => 'S',
        Instruction::Copy => 'C',
        Instruction::Inc => '>',
        Instruction::Dec => '<',
        Instruction::Jnz => 'J',
        Instruction::Nop => ' ',
    }
}

/// Count every census n-gram whose window starts in `0..len - n`.
///
/// The final window (ending on the last byte) is not counted, matching the
/// runner's census. `n == 0` or `n >= len` gives an empty map.
#[must_use]
pub fn count_ngrams(program: &[u8], n: usize) -> HashMap<String, usize> {
    let mut m = HashMap::new();
    if n == 0 || n >= program.len() {
        return m;
    }
    let chars: Vec<char> = program.iter().copied().map(census_char).collect();
    for w in chars.windows(n).take(program.len() - n) {
        *m.entry(w.iter().collect::<String>()).or_insert(0) += 1;
    }
    m
}

/// Most frequent n-grams, at most `limit`, descending by count.
///
/// Stops at the first n-gram whose count is no more than a tenth (integer
/// division) of the top count. Ties are ordered lexicographically.
#[must_use]
pub fn top_ngrams(program: &[u8], n: usize, limit: usize) -> Vec<(String, usize)> {
    let mut all: Vec<(String, usize)> = count_ngrams(program, n).into_iter().collect();
    all.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let Some(&(_, top)) = all.first() else {
        return all;
    };
    let cutoff = top / 10;
    all.into_iter()
        .take(limit)
        .take_while(|(_, c)| *c > cutoff)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_window_is_skipped() {
        // Census "PCPC": windows at 0 and 1 only -> "PC", "CP".
        let m = count_ngrams(&[0x00, 0x20, 0x00, 0x20], 2);
        assert_eq!(m.get("PC"), Some(&1));
        assert_eq!(m.get("CP"), Some(&1));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn degenerate_sizes() {
        assert!(count_ngrams(&[1, 2, 3], 0).is_empty());
        assert!(count_ngrams(&[1, 2, 3], 3).is_empty());
        assert!(top_ngrams(&[], 2, 8).is_empty());
    }

    #[test]
    fn nop_bytes_share_a_space() {
        let m = count_ngrams(&[0x3F, 0xFF, 0x80, 0x24], 1);
        assert_eq!(m.get(" "), Some(&3));
    }

    #[test]
    fn immediates_collapse_into_one_class() {
        let top = top_ngrams(&[0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x3F], 1, 8);
        assert_eq!(top, vec![("P".to_string(), 6)]);

        // Shift-pushes with different immediates share "S"; pairs fold too.
        let m = count_ngrams(&[0x10, 0x0F, 0x1F, 0x00, 0x15, 0x20], 2);
        assert_eq!(m.get("SP"), Some(&2));
        assert_eq!(m.get("PS"), Some(&2));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn census_alphabet_by_class() {
        let chars: String = [0x07, 0x1A, 0x20, 0x21, 0x22, 0x23, 0x40]
            .iter()
            .map(|&b| census_char(b))
            .collect();
        assert_eq!(chars, "PSC><J ");
    }

    #[test]
    fn ordering_cutoff_and_limit() {
        // 40 x COPY, then four pushes (one class) and five INCs.
        let mut p = vec![0x20u8; 40];
        p.extend_from_slice(&[0x00, 0x01, 0x02, 0x03, 0x21, 0x21, 0x21, 0x21, 0x21, 0x20]);
        let top = top_ngrams(&p, 1, 8);
        assert_eq!(top[0], ("C".to_string(), 40));
        assert_eq!(top[1], (">".to_string(), 5));
        // 40 / 10 = 4: the folded pushes (count 4) are cut off.
        assert_eq!(top.len(), 2);

        let one = top_ngrams(&p, 1, 1);
        assert_eq!(one.len(), 1);
    }

    #[test]
    fn ties_are_lexicographic() {
        let top = top_ngrams(&[0x20, 0x21, 0x20, 0x21, 0x22], 1, 8);
        assert_eq!(top, vec![(">".to_string(), 2), ("C".to_string(), 2)]);
    }
}
