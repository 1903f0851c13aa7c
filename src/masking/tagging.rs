//! Placeholder tag assignment and value deduplication.
//!
//! Each resolved span receives a stable, human-readable tag such as
//! `[EMAIL_ADDRESS_1]`. Repeated logical values (equal under their
//! label's normalization rule) reuse the tag minted for the first
//! occurrence. All state lives in an explicit [`TagRegistry`] owned by the
//! calling pipeline, so concurrent masking of different documents shares
//! nothing.

use std::collections::{BTreeMap, HashMap};

use crate::models::{Label, Span};

use super::normalize::normalize_for_key;
use super::validators::adjust_score;

/// Per-invocation tag state: one counter per label plus the
/// (label, normalized value) to tag cache that drives reuse.
///
/// Counters start at 1 per label and never step backwards within a run.
#[derive(Debug, Default)]
pub struct TagRegistry {
    counters: HashMap<Label, u32>,
    value_to_tag: HashMap<(Label, String), String>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the tag for `(label, normalized)`, minting a new one on
    /// first sight. The second value is true when the tag was newly
    /// minted.
    fn tag_for(&mut self, label: Label, normalized: String) -> (String, bool) {
        if let Some(tag) = self.value_to_tag.get(&(label, normalized.clone())) {
            return (tag.clone(), false);
        }
        let counter = self.counters.entry(label).or_insert(0);
        *counter += 1;
        let tag = label.tag(*counter);
        self.value_to_tag.insert((label, normalized), tag.clone());
        (tag, true)
    }
}

/// Assign tags to resolved spans in ascending start order, minting
/// through the caller's `registry`.
///
/// Returns the tagged spans together with the tag-to-original mapping
/// (first-seen raw value wins) and the tag-to-score map (maximum
/// validator-adjusted confidence across occurrences). Passing the same
/// registry across calls keeps counters and dedup continuous; the
/// masking pipeline passes a fresh one per text.
pub fn assign_tags(
    mut spans: Vec<Span>,
    registry: &mut TagRegistry,
) -> (Vec<Span>, BTreeMap<String, String>, BTreeMap<String, f64>) {
    let mut mapping: BTreeMap<String, String> = BTreeMap::new();
    let mut scores: BTreeMap<String, f64> = BTreeMap::new();

    for span in &mut spans {
        let normalized = normalize_for_key(span.label, &span.original);
        let (tag, minted) = registry.tag_for(span.label, normalized);

        if minted {
            mapping.insert(tag.clone(), span.original.clone());
        }

        let adjusted = adjust_score(span.label, &span.original, span.score);
        let entry = scores.entry(tag.clone()).or_insert(0.0);
        if adjusted > *entry {
            *entry = adjusted;
        }

        span.score = adjusted;
        span.tag = Some(tag);
    }

    (spans, mapping, scores)
}
