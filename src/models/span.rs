//! Candidate and resolved detection spans.
//!
//! A [`Span`] is one detection over the source text: a half-open byte
//! range, a canonical label, a confidence score, and the exact substring
//! captured at extraction time. Spans are validated against the text they
//! were computed from before entering the resolver.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Label;

/// Which kind of detector produced a span. Diagnostics only; resolution
/// logic never looks at this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Statistical entity-detection model.
    Model,
    /// Deterministic regex pattern extractor.
    Pattern,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Pattern => "pattern",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for span validation at the input boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum SpanError {
    /// `start >= end`
    InvalidRange { start: usize, end: usize },

    /// Offsets outside the text, or not on UTF-8 character boundaries
    OutOfBounds { start: usize, end: usize, len: usize },

    /// `original` does not equal `text[start..end]`: the span was
    /// computed against different text
    StaleOriginal { start: usize, end: usize },

    /// Detector label could not be mapped to a canonical label
    UnknownLabel { raw: String },
}

impl fmt::Display for SpanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRange { start, end } => {
                write!(f, "Invalid span range: start {} >= end {}", start, end)
            }
            Self::OutOfBounds { start, end, len } => {
                write!(
                    f,
                    "Span {}..{} is out of bounds for text of length {}",
                    start, end, len
                )
            }
            Self::StaleOriginal { start, end } => {
                write!(
                    f,
                    "Span {}..{} does not match the text it claims to cover",
                    start, end
                )
            }
            Self::UnknownLabel { raw } => write!(f, "Unknown detector label: '{}'", raw),
        }
    }
}

impl std::error::Error for SpanError {}

/// A candidate or resolved detection over the source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
    /// Canonical label.
    pub label: Label,
    /// Confidence in `[0.0, 1.0]`.
    pub score: f64,
    /// Which detector produced this span.
    pub source: Provenance,
    /// Exact substring `text[start..end]` captured at extraction time.
    pub original: String,
    /// Placeholder tag, absent until assigned by the tagging engine.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tag: Option<String>,
}

impl Span {
    /// Create a span over `text`, capturing the covered substring.
    ///
    /// Fails if the range is empty, out of bounds, or not aligned to
    /// character boundaries.
    pub fn new(
        text: &str,
        start: usize,
        end: usize,
        label: Label,
        score: f64,
        source: Provenance,
    ) -> Result<Self, SpanError> {
        check_range(text, start, end)?;
        Ok(Self {
            start,
            end,
            label,
            score,
            source,
            original: text[start..end].to_string(),
            tag: None,
        })
    }

    /// Number of bytes this span covers.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Validate this span against the text it must have been computed from.
    ///
    /// A failed `StaleOriginal` check is never silently corrected: it means
    /// the caller is mixing spans and texts, which poisons every offset in
    /// the batch.
    pub fn validate(&self, text: &str) -> Result<(), SpanError> {
        check_range(text, self.start, self.end)?;
        if self.original != text[self.start..self.end] {
            return Err(SpanError::StaleOriginal {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// True if this span shares at least one byte position with `other`.
    pub fn overlaps(&self, other: &Span) -> bool {
        !(self.end <= other.start || self.start >= other.end)
    }
}

fn check_range(text: &str, start: usize, end: usize) -> Result<(), SpanError> {
    if start >= end {
        return Err(SpanError::InvalidRange { start, end });
    }
    if end > text.len() || !text.is_char_boundary(start) || !text.is_char_boundary(end) {
        return Err(SpanError::OutOfBounds {
            start,
            end,
            len: text.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, start: usize, end: usize) -> Span {
        Span::new(text, start, end, Label::EmailAddress, 0.9, Provenance::Pattern).unwrap()
    }

    #[test]
    fn test_new_captures_original() {
        let s = span("write to alice@example.com today", 9, 26);
        assert_eq!(s.original, "alice@example.com");
        assert_eq!(s.len(), 17);
        assert!(s.tag.is_none());
    }

    #[test]
    fn test_new_rejects_empty_range() {
        let err = Span::new("abc", 2, 2, Label::Date, 0.5, Provenance::Model).unwrap_err();
        assert_eq!(err, SpanError::InvalidRange { start: 2, end: 2 });
    }

    #[test]
    fn test_new_rejects_inverted_range() {
        let err = Span::new("abc", 2, 1, Label::Date, 0.5, Provenance::Model).unwrap_err();
        assert!(matches!(err, SpanError::InvalidRange { .. }));
    }

    #[test]
    fn test_new_rejects_out_of_bounds() {
        let err = Span::new("abc", 1, 9, Label::Date, 0.5, Provenance::Model).unwrap_err();
        assert_eq!(
            err,
            SpanError::OutOfBounds {
                start: 1,
                end: 9,
                len: 3
            }
        );
    }

    #[test]
    fn test_new_rejects_non_char_boundary() {
        // 'é' is two bytes; offset 1 splits it
        let err = Span::new("émail", 1, 3, Label::Date, 0.5, Provenance::Model).unwrap_err();
        assert!(matches!(err, SpanError::OutOfBounds { .. }));
    }

    #[test]
    fn test_validate_detects_stale_original() {
        let mut s = span("alice@example.com ok", 0, 17);
        s.original = "bob@example.com".to_string();
        assert!(matches!(
            s.validate("alice@example.com ok"),
            Err(SpanError::StaleOriginal { .. })
        ));
    }

    #[test]
    fn test_validate_detects_different_text() {
        let s = span("alice@example.com ok", 0, 17);
        assert!(s.validate("alice@example.com ok").is_ok());
        assert!(s.validate("completely different text here").is_err());
    }

    #[test]
    fn test_overlaps_relations() {
        let text = "0123456789";
        let a = span(text, 2, 6);
        assert!(a.overlaps(&span(text, 4, 8))); // partial
        assert!(a.overlaps(&span(text, 3, 5))); // contained
        assert!(a.overlaps(&span(text, 0, 9))); // containing
        assert!(a.overlaps(&span(text, 5, 6))); // single shared byte
        assert!(!a.overlaps(&span(text, 6, 8))); // adjacent after
        assert!(!a.overlaps(&span(text, 0, 2))); // adjacent before
    }

    #[test]
    fn test_span_serde_round_trip() {
        let s = span("alice@example.com", 0, 17);
        let json = serde_json::to_string(&s).unwrap();
        assert!(!json.contains("\"tag\""));
        let back: Span = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
