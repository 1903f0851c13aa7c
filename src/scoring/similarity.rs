//! String similarity for lenient matching.
//!
//! Both sides are normalized to bare lowercase alphanumerics before
//! comparison. Exact matches and long containments short-circuit; anything
//! else falls through to a longest-common-subsequence ratio.

/// Lowercase, trim, and strip every character outside `[a-z0-9]`.
pub fn norm_for_match(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Character-level similarity ratio in `[0, 1]`:
/// `2 * lcs(a, b) / (|a| + |b|)`.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let lcs = lcs_length(&a, &b);
    2.0 * lcs as f64 / (a.len() + b.len()) as f64
}

/// Two-row LCS dynamic program.
fn lcs_length(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Score one expected value against one found value.
///
/// - exact normalized equality: 1.0
/// - one side contained in the other, shorter side at least 6 chars: 0.95
/// - otherwise the LCS similarity ratio
///
/// Either side normalizing to empty scores 0.0.
pub fn match_score(expected: &str, found: &str) -> f64 {
    let e = norm_for_match(expected);
    let f = norm_for_match(found);
    if e.is_empty() || f.is_empty() {
        return 0.0;
    }
    if e == f {
        return 1.0;
    }
    let (shorter, longer) = if e.len() <= f.len() { (&e, &f) } else { (&f, &e) };
    if shorter.len() >= 6 && longer.contains(shorter.as_str()) {
        return 0.95;
    }
    similarity_ratio(&e, &f)
}
