//! Candidate span sources.
//!
//! The masking core is detector-agnostic: anything that can produce spans
//! over a text is a [`SpanSource`]. The built-in source is the regex
//! [`PatternExtractor`]; output from an external entity-detection model
//! enters through [`convert_detections`], which maps detector label
//! strings to the canonical registry and validates offsets at the
//! boundary.

mod address;
mod patterns;

pub use patterns::{PatternExtractor, extract_pattern_spans};

use serde::Deserialize;

use crate::models::{Label, Provenance, Span, SpanError};

/// A detector that produces candidate spans from raw text.
///
/// Sources never resolve overlaps among their own matches; reconciliation
/// is global and happens in the masking pipeline.
pub trait SpanSource {
    /// Short provenance name for diagnostics.
    fn name(&self) -> &'static str;

    /// Extract candidate spans from `text`.
    fn extract(&self, text: &str) -> Vec<Span>;
}

/// One raw detection from an external model, as deserialized from its
/// JSON output. Labels are the detector's own vocabulary, not canonical.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDetection {
    pub start: usize,
    pub end: usize,
    pub label: String,
    #[serde(default)]
    pub score: f64,
}

/// Convert raw model detections into validated candidate spans.
///
/// Detections with unmappable labels or bad offsets are returned as
/// errors alongside the good spans: one bad detection never discards the
/// rest, and the caller decides how loudly to report the rejects.
pub fn convert_detections(
    text: &str,
    detections: Vec<RawDetection>,
) -> (Vec<Span>, Vec<SpanError>) {
    let mut spans = Vec::with_capacity(detections.len());
    let mut errors = Vec::new();

    for det in detections {
        let Some(label) = Label::from_detector(&det.label) else {
            errors.push(SpanError::UnknownLabel { raw: det.label });
            continue;
        };
        match Span::new(text, det.start, det.end, label, det.score, Provenance::Model) {
            Ok(span) => spans.push(span),
            Err(e) => errors.push(e),
        }
    }

    (spans, errors)
}
