//! String similarity used for fuzzy company matching.

/// Similarity ratio in 0..=100 based on indel distance.
///
/// `round(100 * 2 * LCS / (len_a + len_b))` over chars, with ties rounded to even.
/// This agrees with the classic `fuzz.ratio` score on names.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let lcs = longest_common_subsequence(&a, &b);
    let score = 100.0 * (2 * lcs) as f64 / total as f64;
    score.round_ties_even() as u8
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Candidate pairs the pruned strategy never scores.
///
/// Pairs whose char lengths differ by more than half the longer one, or whose first
/// chars differ, are skipped before any similarity computation.
pub fn is_pruned(query: &str, query_len: usize, candidate: &str, candidate_len: usize) -> bool {
    let longest = query_len.max(candidate_len) as f64;
    if query_len.abs_diff(candidate_len) as f64 > longest * 0.5 {
        return true;
    }
    match (query.chars().next(), candidate.chars().next()) {
        (Some(q), Some(c)) => q != c,
        _ => false,
    }
}
