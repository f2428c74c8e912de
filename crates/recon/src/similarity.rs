//! String similarity scoring on a 0–100 scale.

/// Pairwise string similarity. Implementations must return a score in [0, 100].
pub trait Similarity {
    fn score(&self, a: &str, b: &str) -> f64;
}

impl<F> Similarity for F
where
    F: Fn(&str, &str) -> f64,
{
    fn score(&self, a: &str, b: &str) -> f64 {
        self(a, b)
    }
}

/// Normalized Indel similarity: `100 * 2 * LCS(a, b) / (|a| + |b|)`.
///
/// Lengths count Unicode scalar values. Two empty strings are identical (100).
#[derive(Debug, Clone, Copy, Default)]
pub struct IndelRatio;

impl Similarity for IndelRatio {
    fn score(&self, a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let total = a.len() + b.len();
        if total == 0 {
            return 100.0;
        }
        let lcs = lcs_len(&a, &b);
        100.0 * (2 * lcs) as f64 / total as f64
    }
}

/// Longest common subsequence length, single-row DP.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut row = vec![0usize; inner.len() + 1];

    for &oc in outer {
        let mut diag = 0;
        for (j, &ic) in inner.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if oc == ic {
                diag + 1
            } else {
                above.max(row[j])
            };
            diag = above;
        }
    }

    row[inner.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn lcs_lengths() {
        let chars = |s: &str| s.chars().collect::<Vec<_>>();
        assert_eq!(lcs_len(&chars(""), &chars("")), 0);
        assert_eq!(lcs_len(&chars("abc"), &chars("abc")), 3);
        assert_eq!(lcs_len(&chars("kitten"), &chars("sitting")), 4);
        assert_eq!(lcs_len(&chars("Bob"), &chars("Robert")), 2);
    }

    #[test]
    fn identical_strings_score_100() {
        assert!(approx(IndelRatio.score("Alice", "Alice"), 100.0));
        assert!(approx(IndelRatio.score("", ""), 100.0));
    }

    #[test]
    fn disjoint_strings_score_0() {
        assert!(approx(IndelRatio.score("abc", "xyz"), 0.0));
        assert!(approx(IndelRatio.score("abc", ""), 0.0));
    }

    #[test]
    fn partial_overlap() {
        // LCS("Alice", "Alicia") = "Alic" → 2*4 / 11
        assert!(approx(IndelRatio.score("Alice", "Alicia"), 800.0 / 11.0));
        // LCS("Bob", "Robert") = "ob" → 2*2 / 9
        assert!(approx(IndelRatio.score("Bob", "Robert"), 400.0 / 9.0));
    }

    #[test]
    fn symmetric() {
        let s1 = IndelRatio.score("Jonathan Smith", "Jon Smyth");
        let s2 = IndelRatio.score("Jon Smyth", "Jonathan Smith");
        assert!(approx(s1, s2));
    }

    #[test]
    fn counts_chars_not_bytes() {
        assert!(approx(IndelRatio.score("José", "Jose"), 75.0));
    }

    #[test]
    fn closures_are_scorers() {
        let fixed = |_: &str, _: &str| 42.0;
        assert!(approx(fixed.score("a", "b"), 42.0));
    }
}
