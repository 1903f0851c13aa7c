//! Deterministic regex span extraction.
//!
//! Pattern detection backstops the statistical model for value shapes it
//! reliably misses: phone numbers, IPv4 addresses, postcodes, emails, and
//! dates. Matches carry fixed high confidences; reconciliation with model
//! spans happens globally in the resolver, never here.
//!
//! All patterns are compiled once at startup.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Label, Provenance, Span};

use super::SpanSource;
use super::address::expand_to_address_block;

pub(super) static UK_POSTCODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([A-Z]{1,2}\d[A-Z\d]?\s*\d[A-Z]{2})\b").expect("valid regex"));

static IPV4_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("valid regex"));

static UK_LANDLINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"0\d{2,4}\s?\d{3,4}\s?\d{3,4}").expect("valid regex"));

static UK_MOBILE_INTL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+44\s?7\d{3}\s?\d{6}").expect("valid regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}").expect("valid regex")
});

// 12 March 1990, 17 feb 1989
static DATE_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?P<day>\d{1,2})\s+(?P<mon>jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:t|tember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\s+(?P<year>\d{4})\b",
    )
    .expect("valid regex")
});

// 21/12/2025, 21-12-2025, 21.12.2025 (kept strict: requires a 4-digit year)
static DATE_NUMERIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?P<day>\d{1,2})[/\-.](?P<mon>\d{1,2})[/\-.](?P<year>\d{4})\b")
        .expect("valid regex")
});

// 2025-12-21 and friends (year first)
static DATE_YMD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?P<year>\d{4})[/\-.](?P<mon>\d{1,2})[/\-.](?P<day>\d{1,2})\b")
        .expect("valid regex")
});

static DOB_CONTEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bDOB\b|\bD\.?O\.?B\.?\b|date\s+of\s+birth|\bborn\b").expect("valid regex")
});

/// Regex-based span source covering phones, IPs, postcodes, addresses,
/// emails, and dates.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternExtractor;

impl PatternExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl SpanSource for PatternExtractor {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn extract(&self, text: &str) -> Vec<Span> {
        extract_pattern_spans(text)
    }
}

/// Run every pattern over `text` and return the raw candidate spans.
pub fn extract_pattern_spans(text: &str) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();

    // Phones. The regex crate has no lookaround, so word-boundary guards
    // are explicit neighbor-character checks.
    for re in [&*UK_LANDLINE_RE, &*UK_MOBILE_INTL_RE] {
        for m in re.find_iter(text) {
            if !bounded_by(text, m.start(), m.end(), |c| {
                c.is_alphanumeric() || c == '_'
            }) {
                continue;
            }
            push_span(&mut spans, text, m.start(), m.end(), Label::UkPhoneNumber, 0.99);
        }
    }

    // IPv4, with octet range validation the regex cannot express.
    for m in IPV4_RE.find_iter(text) {
        if is_valid_ipv4(m.as_str()) {
            push_span(&mut spans, text, m.start(), m.end(), Label::IpAddress, 0.99);
        }
    }

    // Postcodes, plus optional expansion to a full address block.
    let mut seen_address_blocks: Vec<(usize, usize)> = Vec::new();
    for m in UK_POSTCODE_RE.find_iter(text) {
        push_span(&mut spans, text, m.start(), m.end(), Label::UkPostcode, 0.99);

        if let Some((a_start, a_end)) = expand_to_address_block(text, m.start())
            && !seen_address_blocks.contains(&(a_start, a_end))
        {
            seen_address_blocks.push((a_start, a_end));
            push_span(&mut spans, text, a_start, a_end, Label::UkAddress, 0.96);
        }
    }

    // Emails, guarded against matching inside a longer token.
    for m in EMAIL_RE.find_iter(text) {
        if !bounded_by(text, m.start(), m.end(), |c| {
            c.is_alphanumeric() || c == '_' || c == '.' || c == '+' || c == '-'
        }) {
            continue;
        }
        push_span(&mut spans, text, m.start(), m.end(), Label::EmailAddress, 0.99);
    }

    // Dates: textual month names, then the two numeric layouts. All three
    // validate against the real calendar before emitting a span.
    for caps in DATE_TEXT_RE.captures_iter(text) {
        let day: u32 = caps["day"].parse().unwrap_or(0);
        let year: i32 = caps["year"].parse().unwrap_or(0);
        let month = month_number(&caps["mon"]);
        if let Some(month) = month
            && is_valid_date(year, month, day)
        {
            let m = caps.get(0).expect("whole match");
            let label = date_label_for(text, m.start(), m.end());
            push_span(&mut spans, text, m.start(), m.end(), label, 0.97);
        }
    }
    for re in [&*DATE_NUMERIC_RE, &*DATE_YMD_RE] {
        for caps in re.captures_iter(text) {
            let day: u32 = caps["day"].parse().unwrap_or(0);
            let month: u32 = caps["mon"].parse().unwrap_or(0);
            let year: i32 = caps["year"].parse().unwrap_or(0);
            if is_valid_date(year, month, day) {
                let m = caps.get(0).expect("whole match");
                let label = date_label_for(text, m.start(), m.end());
                push_span(&mut spans, text, m.start(), m.end(), label, 0.97);
            }
        }
    }

    spans
}

fn push_span(spans: &mut Vec<Span>, text: &str, start: usize, end: usize, label: Label, score: f64) {
    if let Ok(span) = Span::new(text, start, end, label, score, Provenance::Pattern) {
        spans.push(span);
    }
}

/// True when the characters immediately around `start..end` do not match
/// `is_joining`, the manual stand-in for lookaround word boundaries.
fn bounded_by(text: &str, start: usize, end: usize, is_joining: impl Fn(char) -> bool) -> bool {
    if let Some(prev) = text[..start].chars().next_back()
        && is_joining(prev)
    {
        return false;
    }
    if let Some(next) = text[end..].chars().next()
        && is_joining(next)
    {
        return false;
    }
    true
}

fn is_valid_ipv4(s: &str) -> bool {
    let octets: Vec<&str> = s.split('.').collect();
    octets.len() == 4 && octets.iter().all(|o| o.parse::<u8>().is_ok())
}

fn month_number(name: &str) -> Option<u32> {
    let key = name.to_lowercase();
    let key = &key[..key.len().min(3)];
    match key {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}

fn is_valid_date(year: i32, month: u32, day: u32) -> bool {
    (1900..=2100).contains(&year) && NaiveDate::from_ymd_opt(year, month, day).is_some()
}

/// A date near birth-related wording is a DATE_OF_BIRTH, otherwise DATE.
fn date_label_for(text: &str, start: usize, end: usize) -> Label {
    let left_from = floor_char_boundary(text, start.saturating_sub(40));
    let right_to = ceil_char_boundary(text, (end + 25).min(text.len()));
    let context = format!("{} {}", &text[left_from..start], &text[end..right_to]);
    if DOB_CONTEXT_RE.is_match(&context) {
        Label::DateOfBirth
    } else {
        Label::Date
    }
}

fn floor_char_boundary(text: &str, mut i: usize) -> usize {
    while i > 0 && !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(text: &str, mut i: usize) -> usize {
    while i < text.len() && !text.is_char_boundary(i) {
        i += 1;
    }
    i
}
