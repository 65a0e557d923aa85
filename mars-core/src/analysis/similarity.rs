//! The canonical sequence-matching ratio
//!
//! `ratio(a, b) = 2*M / T` where `M` is the total length of matching
//! blocks between `a` and `b` and `T` is the sum of their lengths — the
//! same metric Python's `difflib.SequenceMatcher.ratio()` computes. We get
//! it from `similar`'s diff machinery rather than hand-rolling LCS.

use similar::TextDiff;

/// Character-level sequence-matching ratio in [0, 1]. `1.0` iff `a == b`.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    TextDiff::from_chars(a, b).ratio() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_have_ratio_one() {
        assert_eq!(ratio("the sky is blue", "the sky is blue"), 1.0);
    }

    #[test]
    fn empty_strings_have_ratio_one() {
        assert_eq!(ratio("", ""), 1.0);
    }

    #[test]
    fn completely_different_strings_have_low_ratio() {
        assert!(ratio("abcdef", "uvwxyz") < 0.3);
    }

    #[test]
    fn near_identical_strings_have_high_ratio() {
        let r = ratio("the sky is blue today", "the sky is blue today.");
        assert!(r > 0.9);
    }
}
