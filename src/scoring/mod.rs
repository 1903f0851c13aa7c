//! Lenient matching and detection-quality scoring.
//!
//! A found-value set (derived from a masking run's tag mapping) is scored
//! against an expected-value set per label. Matching is lenient, tolerant
//! of punctuation, casing, and partial captures, but strictly one-to-one:
//! once a found value is reserved by an expected value it can satisfy no
//! other.

mod similarity;

pub use similarity::{match_score, norm_for_match, similarity_ratio};

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Label, Metrics};

/// Default acceptance threshold for a lenient match.
pub const DEFAULT_SIM_THRESHOLD: f64 = 0.88;

/// Values grouped by label, one side of a scoring comparison.
pub type TypedValues = BTreeMap<Label, BTreeSet<String>>;

/// Group a tag-to-value mapping by the label embedded in each tag.
///
/// Tags that do not parse as `[LABEL_N]` are ignored.
pub fn build_found_typed(mapping: &BTreeMap<String, String>) -> TypedValues {
    let mut out: TypedValues = BTreeMap::new();
    for (tag, value) in mapping {
        if let Some(label) = Label::from_tag(tag) {
            out.entry(label).or_default().insert(value.clone());
        }
    }
    out
}

/// Score `found` against `expected` with the default threshold.
pub fn score_typed(expected: &TypedValues, found: &TypedValues) -> Metrics {
    score_typed_with_threshold(expected, found, DEFAULT_SIM_THRESHOLD)
}

/// Score `found` against `expected`.
///
/// Each expected value searches the still-unreserved found values across
/// all labels for its best lenient match; a match at or above
/// `sim_threshold` reserves that found value. Expected values are
/// processed in label-then-value order, so scoring is deterministic.
///
/// When there are no expected values the metrics are 100 if nothing was
/// found either, else 0, since neither ratio is defined on its own.
pub fn score_typed_with_threshold(
    expected: &TypedValues,
    found: &TypedValues,
    sim_threshold: f64,
) -> Metrics {
    let expected_pairs: Vec<(Label, &str)> = expected
        .iter()
        .flat_map(|(label, values)| values.iter().map(move |v| (*label, v.as_str())))
        .collect();
    let found_pairs: Vec<(Label, &str)> = found
        .iter()
        .flat_map(|(label, values)| values.iter().map(move |v| (*label, v.as_str())))
        .collect();

    let total_expected = expected_pairs.len();

    let mut reserved = vec![false; found_pairs.len()];
    let mut matched_expected = 0usize;
    let mut correct_type_hits = 0usize;

    for (exp_label, exp_val) in &expected_pairs {
        let mut best: Option<(usize, f64, bool)> = None;
        for (j, (found_label, found_val)) in found_pairs.iter().enumerate() {
            if reserved[j] {
                continue;
            }
            let score = match_score(exp_val, found_val);
            let improves = match best {
                None => true,
                Some((_, best_score, _)) => score > best_score,
            };
            if improves {
                best = Some((j, score, found_label == exp_label));
            }
        }
        if let Some((j, score, type_ok)) = best
            && score >= sim_threshold
        {
            reserved[j] = true;
            matched_expected += 1;
            if type_ok {
                correct_type_hits += 1;
            }
        }
    }

    let false_positives_total = reserved.iter().filter(|r| !**r).count();
    let mut false_positives_by_type: BTreeMap<Label, usize> = BTreeMap::new();
    for (j, (found_label, _)) in found_pairs.iter().enumerate() {
        if !reserved[j] {
            *false_positives_by_type.entry(*found_label).or_insert(0) += 1;
        }
    }

    let (recall, type_accuracy) = if total_expected == 0 {
        // Neither ratio is defined with nothing expected; an empty found
        // set is a perfect run, anything else is pure noise.
        if found_pairs.is_empty() {
            (100.0, 100.0)
        } else {
            (0.0, 0.0)
        }
    } else {
        let recall = matched_expected as f64 / total_expected as f64 * 100.0;
        let type_accuracy = if matched_expected == 0 {
            0.0
        } else {
            correct_type_hits as f64 / matched_expected as f64 * 100.0
        };
        (recall, type_accuracy)
    };

    Metrics {
        recall,
        type_accuracy,
        overall: (recall / 100.0) * (type_accuracy / 100.0) * 100.0,
        found_count: found_pairs.len(),
        expected_count: total_expected,
        false_positives_total,
        false_positives_by_type,
    }
}
