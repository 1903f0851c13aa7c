//! Span overlap resolution.
//!
//! Candidates from every detector are reconciled globally: a greedy walk
//! over a deterministically ordered candidate list keeps each span only if
//! it shares no byte position with an already-kept span. The ordering is a
//! priority policy, not an optimality heuristic: this is interval
//! scheduling by domain preference, and it is deliberately not a
//! maximum-coverage selection.

use std::cmp::Ordering;

use log::debug;

use crate::models::Span;

/// Select a pairwise non-overlapping subset of `candidates`.
///
/// Candidates are ranked by label priority, then span length, then score,
/// with ascending start offset as the final tie-break, so identical input
/// always yields identical output. The kept set is returned in ascending
/// start order.
///
/// Candidates must already be validated against the source text; this
/// function is pure and does not inspect the text itself.
pub fn resolve_overlaps(mut candidates: Vec<Span>) -> Vec<Span> {
    candidates.sort_by(compare_candidates);

    let mut kept: Vec<Span> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if kept.iter().any(|k| candidate.overlaps(k)) {
            debug!(
                "Discarding {} span {}..{} overlapped by a higher-ranked span",
                candidate.label, candidate.start, candidate.end
            );
            continue;
        }
        kept.push(candidate);
    }

    kept.sort_by_key(|s| s.start);
    kept
}

/// Composite ranking: higher priority, then longer, then more confident,
/// then earlier in the text.
fn compare_candidates(a: &Span, b: &Span) -> Ordering {
    b.label
        .priority()
        .cmp(&a.label.priority())
        .then_with(|| b.len().cmp(&a.len()))
        .then_with(|| b.score.total_cmp(&a.score))
        .then_with(|| a.start.cmp(&b.start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Label, Provenance};

    fn candidate(text: &str, start: usize, end: usize, label: Label, score: f64) -> Span {
        Span::new(text, start, end, label, score, Provenance::Model).unwrap()
    }

    const TEXT: &str = "GB82WEST12345698765432 and 0123456789 plus trailing filler text";

    #[test]
    fn test_empty_input() {
        assert!(resolve_overlaps(Vec::new()).is_empty());
    }

    #[test]
    fn test_non_overlapping_spans_all_kept() {
        let spans = vec![
            candidate(TEXT, 27, 37, Label::UkAccountNumber, 0.8),
            candidate(TEXT, 0, 22, Label::UkIban, 0.9),
        ];
        let kept = resolve_overlaps(spans);
        assert_eq!(kept.len(), 2);
        // ascending start order
        assert_eq!(kept[0].start, 0);
        assert_eq!(kept[1].start, 27);
    }

    #[test]
    fn test_priority_dominates_score_and_length() {
        // Account number nested in an IBAN with a higher score: IBAN wins
        // because priority is compared before anything else.
        let spans = vec![
            candidate(TEXT, 4, 12, Label::UkAccountNumber, 0.95),
            candidate(TEXT, 0, 20, Label::UkIban, 0.9),
        ];
        let kept = resolve_overlaps(spans);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].label, Label::UkIban);
    }

    #[test]
    fn test_location_loses_to_any_overlapping_label() {
        let spans = vec![
            candidate(TEXT, 0, 12, Label::Location, 0.99),
            candidate(TEXT, 5, 11, Label::Org, 0.1),
        ];
        let kept = resolve_overlaps(spans);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].label, Label::Org);
    }

    #[test]
    fn test_longer_span_wins_within_label() {
        let spans = vec![
            candidate(TEXT, 0, 10, Label::Person, 0.99),
            candidate(TEXT, 0, 22, Label::Person, 0.5),
        ];
        let kept = resolve_overlaps(spans);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].end, 22);
    }

    #[test]
    fn test_score_breaks_equal_length_ties() {
        let spans = vec![
            candidate(TEXT, 0, 10, Label::Person, 0.6),
            candidate(TEXT, 5, 15, Label::Person, 0.9),
        ];
        let kept = resolve_overlaps(spans);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].start, 5);
    }

    #[test]
    fn test_start_breaks_full_ties_deterministically() {
        let spans = vec![
            candidate(TEXT, 5, 15, Label::Person, 0.9),
            candidate(TEXT, 0, 10, Label::Person, 0.9),
        ];
        let kept = resolve_overlaps(spans);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].start, 0);
    }

    #[test]
    fn test_adjacent_spans_do_not_conflict() {
        let spans = vec![
            candidate(TEXT, 0, 10, Label::Person, 0.9),
            candidate(TEXT, 10, 20, Label::Person, 0.9),
        ];
        let kept = resolve_overlaps(spans);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_single_shared_byte_conflicts() {
        let spans = vec![
            candidate(TEXT, 0, 11, Label::Person, 0.9),
            candidate(TEXT, 10, 20, Label::Person, 0.5),
        ];
        let kept = resolve_overlaps(spans);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].end, 11);
    }

    #[test]
    fn test_no_overlap_invariant_holds() {
        let spans = vec![
            candidate(TEXT, 0, 22, Label::UkIban, 0.9),
            candidate(TEXT, 4, 12, Label::UkAccountNumber, 0.95),
            candidate(TEXT, 10, 30, Label::Person, 0.99),
            candidate(TEXT, 27, 37, Label::UkAccountNumber, 0.8),
            candidate(TEXT, 30, 40, Label::Date, 0.7),
        ];
        let kept = resolve_overlaps(spans);
        for (i, a) in kept.iter().enumerate() {
            for b in kept.iter().skip(i + 1) {
                assert!(!a.overlaps(b), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_determinism_across_runs() {
        let spans = vec![
            candidate(TEXT, 0, 10, Label::Person, 0.9),
            candidate(TEXT, 5, 15, Label::Person, 0.9),
            candidate(TEXT, 8, 18, Label::Org, 0.9),
            candidate(TEXT, 20, 30, Label::Date, 0.9),
        ];
        let a = resolve_overlaps(spans.clone());
        let b = resolve_overlaps(spans);
        assert_eq!(a, b);
    }
}
