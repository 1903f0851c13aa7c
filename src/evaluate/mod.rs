//! Evaluation of detection quality against labeled fixtures.
//!
//! A fixture bundle is a JSON file of test cases, each with an input text
//! and the PII values a perfect run would find, grouped by label. Every
//! case is masked with the built-in pattern source plus any model
//! detections recorded in the fixture, then scored with the lenient
//! matcher. One broken fixture never stops the rest of the bundle.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use indicatif::ProgressBar;
use log::warn;
use rayon::prelude::*;
use serde::Deserialize;

use crate::extractors::{RawDetection, convert_detections, extract_pattern_spans};
use crate::masking::mask;
use crate::models::{
    Aggregate, CaseReport, EvalHeader, EvalReport, Label, Metrics,
    REDACTANT_OUTPUT_FORMAT_VERSION,
};
use crate::scoring::{TypedValues, build_found_typed, score_typed};

/// One labeled test case.
#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    pub id: String,
    pub text: String,
    /// Expected values by canonical label name.
    #[serde(default)]
    pub expected_typed: BTreeMap<String, Vec<String>>,
    /// Optional pre-recorded model detections for this text.
    #[serde(default)]
    pub detections: Vec<RawDetection>,
}

/// A bundle of fixtures, the on-disk evaluation format.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureBundle {
    pub tests: Vec<Fixture>,
}

/// Evaluation options from the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvalOptions {
    /// Evaluate only the first `limit` fixtures.
    pub limit: Option<usize>,
    /// Include masked text in each case report.
    pub show_masked: bool,
}

/// Load a fixture bundle from `path`.
pub fn load_bundle(path: &Path) -> Result<FixtureBundle> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read fixture bundle {}", path.display()))?;
    let bundle: FixtureBundle = serde_json::from_str(&content)
        .with_context(|| format!("Unexpected fixture format in {}", path.display()))?;
    Ok(bundle)
}

/// Parse a fixture's expected-values map into canonical labels.
fn parse_expected(raw: &BTreeMap<String, Vec<String>>) -> Result<TypedValues> {
    let mut out = TypedValues::new();
    for (label_str, values) in raw {
        let label: Label = label_str
            .parse()
            .map_err(|_| anyhow!("Unknown expected label '{}'", label_str))?;
        out.entry(label)
            .or_default()
            .extend(values.iter().cloned());
    }
    Ok(out)
}

/// Mask and score a single fixture.
pub fn evaluate_case(fixture: &Fixture) -> Result<(Metrics, String)> {
    let expected = parse_expected(&fixture.expected_typed)?;

    let mut candidates = extract_pattern_spans(&fixture.text);
    let (model_spans, rejects) = convert_detections(&fixture.text, fixture.detections.clone());
    for reject in rejects {
        warn!("Fixture '{}': dropping detection: {}", fixture.id, reject);
    }
    candidates.extend(model_spans);

    let output = mask(&fixture.text, candidates)
        .map_err(|e| anyhow!("Masking failed for fixture '{}': {}", fixture.id, e))?;

    let found = build_found_typed(&output.mapping);
    Ok((score_typed(&expected, &found), output.masked_text))
}

/// Evaluate a bundle, fixture by fixture, in parallel.
///
/// Fixtures are independent, so they fan out across the rayon pool; the
/// report preserves bundle order regardless of completion order. Failed
/// cases carry an error string instead of metrics.
pub fn run_eval(
    bundle: &FixtureBundle,
    options: EvalOptions,
    progress_bar: Arc<ProgressBar>,
) -> EvalReport {
    let start_time = Utc::now();

    let fixtures: &[Fixture] = match options.limit {
        Some(limit) => &bundle.tests[..limit.min(bundle.tests.len())],
        None => &bundle.tests,
    };

    let cases: Vec<CaseReport> = fixtures
        .par_iter()
        .map(|fixture| {
            let report = match evaluate_case(fixture) {
                Ok((metrics, masked_text)) => CaseReport {
                    id: fixture.id.clone(),
                    metrics: Some(metrics),
                    masked_text: options.show_masked.then_some(masked_text),
                    error: None,
                },
                Err(e) => CaseReport {
                    id: fixture.id.clone(),
                    metrics: None,
                    masked_text: None,
                    error: Some(e.to_string()),
                },
            };
            progress_bar.inc(1);
            report
        })
        .collect();

    let end_time = Utc::now();
    let duration = (end_time - start_time).num_nanoseconds().unwrap_or(0) as f64 / 1_000_000_000.0;

    let cases_failed = cases.iter().filter(|c| c.error.is_some()).count();
    let aggregate = aggregate_cases(&cases);

    EvalReport {
        header: EvalHeader {
            start_timestamp: start_time.to_rfc3339(),
            end_timestamp: end_time.to_rfc3339(),
            duration,
            cases_total: cases.len(),
            cases_failed,
            output_format_version: REDACTANT_OUTPUT_FORMAT_VERSION.to_string(),
        },
        cases,
        aggregate,
    }
}

/// Macro-average the scored cases. `None` when nothing was scored.
fn aggregate_cases(cases: &[CaseReport]) -> Option<Aggregate> {
    let scored: Vec<&Metrics> = cases.iter().filter_map(|c| c.metrics.as_ref()).collect();
    if scored.is_empty() {
        return None;
    }
    let n = scored.len() as f64;
    Some(Aggregate {
        recall: scored.iter().map(|m| m.recall).sum::<f64>() / n,
        type_accuracy: scored.iter().map(|m| m.type_accuracy).sum::<f64>() / n,
        overall: scored.iter().map(|m| m.overall).sum::<f64>() / n,
        found_count: scored.iter().map(|m| m.found_count).sum(),
        expected_count: scored.iter().map(|m| m.expected_count).sum(),
        false_positives_total: scored.iter().map(|m| m.false_positives_total).sum(),
    })
}

/// Print one case in the fixed-width report line format.
pub fn print_case(case: &CaseReport) {
    match (&case.metrics, &case.error) {
        (Some(m), _) => {
            println!(
                "{:<10} | Recall: {:.1}% | TypeAcc: {:.1}% | Overall: {:.1}% | FP: {} (found {}, expected {})",
                case.id,
                m.recall,
                m.type_accuracy,
                m.overall,
                m.false_positives_total,
                m.found_count,
                m.expected_count
            );
            if m.false_positives_total > 0 {
                let mut items: Vec<(&Label, &usize)> = m.false_positives_by_type.iter().collect();
                items.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
                let fp_str: Vec<String> = items
                    .iter()
                    .take(12)
                    .map(|(label, count)| format!("{}:{}", label, count))
                    .collect();
                println!("   FP by type: {}", fp_str.join(", "));
            }
        }
        (None, Some(err)) => println!("{:<10} | ERROR: {}", case.id, err),
        (None, None) => println!("{:<10} | no result", case.id),
    }

    if let Some(masked) = &case.masked_text {
        println!("Masked text:");
        println!("{}", masked);
        println!("-");
    }
}

/// Print the macro-averaged aggregate line.
pub fn print_aggregate(aggregate: &Aggregate) {
    println!("=");
    println!(
        "{:<10} | Recall: {:.1}% | TypeAcc: {:.1}% | Overall: {:.1}% | FP: {} (found {}, expected {})",
        "AVG",
        aggregate.recall,
        aggregate.type_accuracy,
        aggregate.overall,
        aggregate.false_positives_total,
        aggregate.found_count,
        aggregate.expected_count
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(id: &str, text: &str, expected: &[(&str, &[&str])]) -> Fixture {
        Fixture {
            id: id.to_string(),
            text: text.to_string(),
            expected_typed: expected
                .iter()
                .map(|(label, values)| {
                    (
                        label.to_string(),
                        values.iter().map(|v| v.to_string()).collect(),
                    )
                })
                .collect(),
            detections: Vec::new(),
        }
    }

    #[test]
    fn test_evaluate_case_perfect_email() {
        let f = fixture(
            "t1",
            "Email alice@example.com",
            &[("EMAIL_ADDRESS", &["alice@example.com"])],
        );
        let (metrics, masked) = evaluate_case(&f).unwrap();
        assert_eq!(metrics.recall, 100.0);
        assert_eq!(metrics.type_accuracy, 100.0);
        assert_eq!(masked, "Email [EMAIL_ADDRESS_1]");
    }

    #[test]
    fn test_evaluate_case_uses_fixture_detections() {
        let f = Fixture {
            id: "t2".to_string(),
            text: "John Smith called".to_string(),
            expected_typed: BTreeMap::from([(
                "PERSON".to_string(),
                vec!["John Smith".to_string()],
            )]),
            detections: vec![RawDetection {
                start: 0,
                end: 10,
                label: "person".to_string(),
                score: 0.85,
            }],
        };
        let (metrics, masked) = evaluate_case(&f).unwrap();
        assert_eq!(metrics.recall, 100.0);
        assert_eq!(masked, "[PERSON_1] called");
    }

    #[test]
    fn test_evaluate_case_unknown_expected_label_fails() {
        let f = fixture("t3", "some text", &[("NOT_A_LABEL", &["x"])]);
        assert!(evaluate_case(&f).is_err());
    }

    #[test]
    fn test_run_eval_isolates_failed_cases() {
        let bundle = FixtureBundle {
            tests: vec![
                fixture("bad", "", &[]),
                fixture(
                    "good",
                    "Email alice@example.com",
                    &[("EMAIL_ADDRESS", &["alice@example.com"])],
                ),
            ],
        };
        let report = run_eval(
            &bundle,
            EvalOptions::default(),
            Arc::new(ProgressBar::hidden()),
        );
        assert_eq!(report.header.cases_total, 2);
        assert_eq!(report.header.cases_failed, 1);
        assert!(report.cases[0].error.is_some());
        assert_eq!(report.cases[1].metrics.as_ref().unwrap().recall, 100.0);
    }

    #[test]
    fn test_run_eval_respects_limit() {
        let bundle = FixtureBundle {
            tests: vec![
                fixture("a", "no pii", &[]),
                fixture("b", "no pii", &[]),
                fixture("c", "no pii", &[]),
            ],
        };
        let report = run_eval(
            &bundle,
            EvalOptions {
                limit: Some(2),
                show_masked: false,
            },
            Arc::new(ProgressBar::hidden()),
        );
        assert_eq!(report.header.cases_total, 2);
    }

    #[test]
    fn test_run_eval_preserves_bundle_order() {
        let bundle = FixtureBundle {
            tests: (0..8)
                .map(|i| fixture(&format!("case-{}", i), "no pii", &[]))
                .collect(),
        };
        let report = run_eval(
            &bundle,
            EvalOptions::default(),
            Arc::new(ProgressBar::hidden()),
        );
        let ids: Vec<&str> = report.cases.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["case-0", "case-1", "case-2", "case-3", "case-4", "case-5", "case-6", "case-7"]
        );
    }

    #[test]
    fn test_aggregate_macro_average() {
        let bundle = FixtureBundle {
            tests: vec![
                fixture(
                    "hit",
                    "Email alice@example.com",
                    &[("EMAIL_ADDRESS", &["alice@example.com"])],
                ),
                fixture("miss", "nothing here", &[("PERSON", &["John Smith"])]),
            ],
        };
        let report = run_eval(
            &bundle,
            EvalOptions::default(),
            Arc::new(ProgressBar::hidden()),
        );
        let agg = report.aggregate.unwrap();
        assert_eq!(agg.recall, 50.0);
        assert_eq!(agg.expected_count, 2);
    }

    #[test]
    fn test_parse_expected_round_trip() {
        let raw = BTreeMap::from([
            ("EMAIL_ADDRESS".to_string(), vec!["a@x.com".to_string()]),
            ("UK_IBAN".to_string(), vec!["GB82WEST12345698765432".to_string()]),
        ]);
        let typed = parse_expected(&raw).unwrap();
        assert!(typed.contains_key(&Label::EmailAddress));
        assert!(typed.contains_key(&Label::UkIban));
    }
}
