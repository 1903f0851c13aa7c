//! Serializable result types for masking and evaluation runs.

use serde::Serialize;
use std::collections::BTreeMap;

use super::{Label, Span};

pub const REDACTANT_OUTPUT_FORMAT_VERSION: &str = "1.0.0";

/// Result of one masking call.
///
/// `mapping` and `scores` are keyed by placeholder tag; both are fresh per
/// call and never shared across texts.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MaskOutput {
    /// Source text with every resolved span replaced by its tag.
    pub masked_text: String,
    /// Tag to first-seen original value.
    pub mapping: BTreeMap<String, String>,
    /// Tag to maximum adjusted confidence across occurrences.
    pub scores: BTreeMap<String, f64>,
    /// Resolved, tagged spans in ascending start order.
    pub spans: Vec<Span>,
}

/// Detection-quality metrics for one evaluation case.
///
/// Percentages are in `[0, 100]`. When a case has no expected values the
/// metrics are defined as 100 for an empty found set and 0 otherwise.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Metrics {
    pub recall: f64,
    pub type_accuracy: f64,
    pub overall: f64,
    pub found_count: usize,
    pub expected_count: usize,
    pub false_positives_total: usize,
    pub false_positives_by_type: BTreeMap<Label, usize>,
}

/// Per-fixture evaluation outcome.
#[derive(Serialize, Debug, Clone)]
pub struct CaseReport {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked_text: Option<String>,
    /// Present when the fixture failed; failures never abort the batch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Macro-averaged totals over all scored cases.
#[derive(Serialize, Debug, Clone)]
pub struct Aggregate {
    pub recall: f64,
    pub type_accuracy: f64,
    pub overall: f64,
    pub found_count: usize,
    pub expected_count: usize,
    pub false_positives_total: usize,
}

#[derive(Serialize, Debug, Clone)]
pub struct EvalHeader {
    pub start_timestamp: String,
    pub end_timestamp: String,
    pub duration: f64,
    pub cases_total: usize,
    pub cases_failed: usize,
    pub output_format_version: String,
}

/// Full evaluation report, serialized to JSON by the CLI.
#[derive(Serialize, Debug, Clone)]
pub struct EvalReport {
    pub header: EvalHeader,
    pub cases: Vec<CaseReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<Aggregate>,
}
