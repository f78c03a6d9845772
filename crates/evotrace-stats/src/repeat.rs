//! Longest repeated prefix substring via the Z-function.
//!
//! `z[i]` is the length of the longest common prefix of `s` and `s[i..]`.
//! The scan keeps the rightmost match box `[l, r)` so the whole array is
//! built in O(n).

use evotrace_core::RepeatResult;

/// Z value at one position and the box left edge after that position's update.
struct ZStep {
    z: usize,
    l: usize,
}

fn z_scan(s: &[u8], mut visit: impl FnMut(ZStep)) -> Vec<usize> {
    let n = s.len();
    let mut z = vec![0usize; n];
    if n == 0 {
        return z;
    }
    z[0] = n;
    let (mut l, mut r) = (0usize, 0usize);
    for i in 1..n {
        let mut k = if i < r { (r - i).min(z[i - l]) } else { 0 };
        while i + k < n && s[k] == s[i + k] {
            k += 1;
        }
        z[i] = k;
        if i + k > r {
            l = i;
            r = i + k;
        }
        visit(ZStep { z: k, l });
    }
    z
}

/// Z array of `s` (`z[0] == s.len()` by convention).
#[must_use]
pub fn z_array(s: &[u8]) -> Vec<usize> {
    z_scan(s, |_| {})
}

/// Longest substring that starts the buffer and occurs again at some `i ≥ 1`
/// (overlap allowed).
///
/// Only repetitions longer than one byte count; anything shorter (including
/// buffers of length 0 or 1) yields [`RepeatResult::empty`]. `start_offset`
/// is the Z-box left edge active when the maximum was first reached, so the
/// bytes at `start_offset` always equal the returned substring.
#[must_use]
pub fn longest_repeated_substring(buffer: &[u8]) -> RepeatResult {
    let (mut max_z, mut at) = (0usize, 0usize);
    z_scan(buffer, |step| {
        if step.z > max_z {
            max_z = step.z;
            at = step.l;
        }
    });
    if max_z <= 1 {
        return RepeatResult::empty();
    }
    RepeatResult {
        substring: buffer[at..at + max_z].to_vec(),
        start_offset: at,
        length: max_z,
    }
}

/// Re-apply [`longest_repeated_substring`] to its own output up to `depth`
/// times, stopping early once nothing repeats. Returns every non-empty level.
#[must_use]
pub fn nested_repeats(buffer: &[u8], depth: usize) -> Vec<RepeatResult> {
    let mut out: Vec<RepeatResult> = Vec::new();
    for _ in 0..depth {
        let src = out.last().map_or(buffer, |r| r.substring.as_slice());
        let r = longest_repeated_substring(src);
        if r.is_empty() {
            break;
        }
        out.push(r);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn naive_z(s: &[u8]) -> Vec<usize> {
        (0..s.len())
            .map(|i| s.iter().zip(&s[i..]).take_while(|(a, b)| a == b).count())
            .collect()
    }

    #[test]
    fn short_inputs_are_empty() {
        assert!(longest_repeated_substring(b"").is_empty());
        assert!(longest_repeated_substring(b"a").is_empty());
        assert!(longest_repeated_substring(b"abc").is_empty());
    }

    #[test]
    fn documented_examples() {
        let r = longest_repeated_substring(b"abcab");
        assert_eq!(r.substring, b"ab");
        assert_eq!((r.start_offset, r.length), (3, 2));

        let r = longest_repeated_substring(b"abcabc");
        assert_eq!(r.substring, b"abc");
        assert_eq!((r.start_offset, r.length), (3, 3));
    }

    #[test]
    fn single_byte_repeat_is_not_enough() {
        // z values top out at 1.
        assert!(longest_repeated_substring(b"abcaa").is_empty());
    }

    #[test]
    fn prefix_repeat_with_trailing_noise() {
        let r = longest_repeated_substring(b"abcabcd");
        assert_eq!(r.substring, b"abc");
        assert_eq!(r.start_offset, 3);
    }

    #[test]
    fn overlapping_run() {
        // "aaaa": z[1] = 3 sets the maximum with box l = 1.
        let r = longest_repeated_substring(b"aaaa");
        assert_eq!(r.substring, b"aaa");
        assert_eq!(r.start_offset, 1);
    }

    #[test]
    fn box_edge_is_captured_when_maximum_is_set() {
        // The max (6) is reached at i=4; z[8] = 2 stays inside that box.
        let s = b"abcdabcdab";
        let r = longest_repeated_substring(s);
        assert_eq!(r.length, 6);
        assert_eq!(r.start_offset, 4);
        assert_eq!(r.substring, b"abcdab");
    }

    #[test]
    fn nested_stops_when_nothing_repeats() {
        let levels = nested_repeats(b"xyxyxyxy", 5);
        assert_eq!(levels[0].substring, b"xyxyxy");
        assert_eq!(levels[1].substring, b"xyxy");
        assert_eq!(levels[2].substring, b"xy");
        assert_eq!(levels.len(), 3);
        assert!(nested_repeats(b"abc", 3).is_empty());
        assert!(nested_repeats(b"abab", 0).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

        #[test]
        fn z_matches_naive(s in proptest::collection::vec(0u8..4, 0..64)) {
            prop_assert_eq!(z_array(&s), naive_z(&s));
        }

        #[test]
        fn result_is_the_longest_prefix_repeat(s in proptest::collection::vec(0u8..3, 0..64)) {
            let best = naive_z(&s).into_iter().skip(1).max().unwrap_or(0);
            let r = longest_repeated_substring(&s);
            if best > 1 {
                prop_assert_eq!(r.length, best);
                prop_assert_eq!(&r.substring[..], &s[..best]);
                prop_assert_eq!(&s[r.start_offset..r.start_offset + best], &s[..best]);
                prop_assert!(r.start_offset >= 1);
            } else {
                prop_assert!(r.is_empty());
            }
        }
    }
}
