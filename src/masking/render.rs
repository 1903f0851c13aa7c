//! Offset-safe text replacement.
//!
//! Tagged spans are substituted back to front so that earlier offsets are
//! never shifted by a replacement that has already happened. Disjointness
//! is guaranteed upstream by the resolver.

use crate::models::Span;

/// Replace every tagged span in `text` with its placeholder tag.
///
/// Spans without a tag are left untouched. Spans must be mutually
/// non-overlapping and valid for `text`.
pub fn render(text: &str, spans: &[Span]) -> String {
    let mut ordered: Vec<&Span> = spans.iter().filter(|s| s.tag.is_some()).collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start));

    let mut masked = text.to_string();
    for span in ordered {
        if let Some(tag) = &span.tag {
            masked.replace_range(span.start..span.end, tag);
        }
    }
    masked
}
