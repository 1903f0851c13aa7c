//! Deterministic masking pipeline.
//!
//! Candidate spans from any mix of detectors are reconciled into one
//! consistent redaction: boundary validation, global overlap resolution,
//! tag assignment with value dedup and validator score adjustment, then
//! offset-safe replacement. The pipeline owns all per-call state; nothing
//! persists between texts.

mod normalize;
mod render;
mod resolve;
mod tagging;
mod validators;

pub use normalize::normalize_for_key;
pub use render::render;
pub use resolve::resolve_overlaps;
pub use tagging::{TagRegistry, assign_tags};
pub use validators::{adjust_score, iban_mod97, luhn_check};

use std::fmt;

use log::warn;

use crate::models::{MaskOutput, Span, SpanError};

/// Error type for a masking call that cannot produce output.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskError {
    /// The input text is empty; there is nothing to mask and offsets are
    /// meaningless.
    EmptyText,

    /// A candidate's captured substring disagrees with the text. The span
    /// was computed against different text, which poisons every offset in
    /// the batch, so the whole call fails rather than guessing.
    StaleSpan(SpanError),
}

impl fmt::Display for MaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyText => write!(f, "Cannot mask empty text"),
            Self::StaleSpan(e) => write!(f, "Candidate span is stale: {}", e),
        }
    }
}

impl std::error::Error for MaskError {}

/// Mask `text` using `candidates` from any number of span sources.
///
/// Candidates with invalid offsets are logged and dropped; one malformed
/// detection must not abort the rest of the text. A stale candidate
/// (captured substring differs from the text) fails the whole call; see
/// [`MaskError::StaleSpan`].
///
/// The same input always produces byte-identical output.
pub fn mask(text: &str, candidates: Vec<Span>) -> Result<MaskOutput, MaskError> {
    if text.is_empty() {
        return Err(MaskError::EmptyText);
    }

    let mut valid = Vec::with_capacity(candidates.len());
    for span in candidates {
        match span.validate(text) {
            Ok(()) => valid.push(span),
            Err(e @ SpanError::StaleOriginal { .. }) => {
                return Err(MaskError::StaleSpan(e));
            }
            Err(e) => {
                warn!("Dropping candidate from {}: {}", span.source, e);
            }
        }
    }

    let resolved = resolve_overlaps(valid);
    let mut registry = TagRegistry::new();
    let (spans, mapping, scores) = assign_tags(resolved, &mut registry);
    let masked_text = render(text, &spans);

    Ok(MaskOutput {
        masked_text,
        mapping,
        scores,
        spans,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Label, Provenance};

    fn candidate(text: &str, start: usize, end: usize, label: Label, score: f64) -> Span {
        Span::new(text, start, end, label, score, Provenance::Pattern).unwrap()
    }

    #[test]
    fn test_mask_single_email() {
        let text = "Email alice@example.com";
        let spans = vec![candidate(text, 6, 23, Label::EmailAddress, 0.99)];
        let out = mask(text, spans).unwrap();
        assert_eq!(out.masked_text, "Email [EMAIL_ADDRESS_1]");
        assert_eq!(out.mapping["[EMAIL_ADDRESS_1]"], "alice@example.com");
        assert_eq!(out.spans.len(), 1);
        assert_eq!(out.spans[0].tag.as_deref(), Some("[EMAIL_ADDRESS_1]"));
    }

    #[test]
    fn test_mask_empty_text_is_terminal() {
        assert_eq!(mask("", Vec::new()), Err(MaskError::EmptyText));
    }

    #[test]
    fn test_mask_empty_candidates_is_valid() {
        let out = mask("no pii here", Vec::new()).unwrap();
        assert_eq!(out.masked_text, "no pii here");
        assert!(out.mapping.is_empty());
        assert!(out.spans.is_empty());
    }

    #[test]
    fn test_mask_drops_invalid_candidate_but_keeps_rest() {
        let text = "Email alice@example.com";
        let good = candidate(text, 6, 23, Label::EmailAddress, 0.99);
        let mut bad = good.clone();
        bad.start = 9;
        bad.end = 9; // invalid range, original no longer checked first
        let out = mask(text, vec![bad, good]).unwrap();
        assert_eq!(out.masked_text, "Email [EMAIL_ADDRESS_1]");
    }

    #[test]
    fn test_mask_stale_candidate_fails_the_call() {
        let text = "Email alice@example.com";
        let mut stale = candidate(text, 6, 23, Label::EmailAddress, 0.99);
        stale.original = "bob@example.com".to_string();
        let err = mask(text, vec![stale]).unwrap_err();
        assert!(matches!(err, MaskError::StaleSpan(_)));
    }

    #[test]
    fn test_mask_nested_lower_priority_span_loses() {
        let text = "GB82WEST12345698765432 is the IBAN";
        let spans = vec![
            candidate(text, 0, 22, Label::UkIban, 0.9),
            candidate(text, 4, 12, Label::UkAccountNumber, 0.95),
        ];
        let out = mask(text, spans).unwrap();
        assert_eq!(out.spans.len(), 1);
        assert_eq!(out.spans[0].label, Label::UkIban);
        assert!(out.masked_text.starts_with("[UK_IBAN_1]"));
    }

    #[test]
    fn test_mask_repeated_value_reuses_tag() {
        let text = "alice@x.com cc alice@x.com";
        let spans = vec![
            candidate(text, 0, 11, Label::EmailAddress, 0.9),
            candidate(text, 15, 26, Label::EmailAddress, 0.9),
        ];
        let out = mask(text, spans).unwrap();
        assert_eq!(out.masked_text, "[EMAIL_ADDRESS_1] cc [EMAIL_ADDRESS_1]");
        assert_eq!(out.mapping.len(), 1);
    }

    #[test]
    fn test_mask_round_trip() {
        let text = "alice@x.com and 020 7946 0958";
        let spans = vec![
            candidate(text, 0, 11, Label::EmailAddress, 0.9),
            candidate(text, 16, 29, Label::UkPhoneNumber, 0.9),
        ];
        let out = mask(text, spans).unwrap();
        let mut restored = out.masked_text.clone();
        for (tag, original) in &out.mapping {
            restored = restored.replace(tag, original);
        }
        assert_eq!(restored, text);
    }

    #[test]
    fn test_mask_is_deterministic() {
        let text = "alice@x.com and 020 7946 0958 twice alice@x.com";
        let make = || {
            vec![
                candidate(text, 36, 47, Label::EmailAddress, 0.8),
                candidate(text, 0, 11, Label::EmailAddress, 0.9),
                candidate(text, 16, 29, Label::UkPhoneNumber, 0.9),
            ]
        };
        let a = mask(text, make()).unwrap();
        let b = mask(text, make()).unwrap();
        assert_eq!(a.masked_text, b.masked_text);
        assert_eq!(a.mapping, b.mapping);
        assert_eq!(a.scores, b.scores);
    }
}
