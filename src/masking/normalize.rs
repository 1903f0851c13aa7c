//! Label-aware value normalization for deduplication keys.
//!
//! Normalization decides whether two raw values denote the same logical
//! entity so they can share one placeholder tag. It is used only for
//! equality comparison, never for display: the first-seen raw value is
//! what ends up in the tag mapping.
//!
//! Some rules are deliberately aggressive (email and IP both collapse to
//! bare alphanumerics), trading rare false merges for stable dedup of the
//! punctuation and spacing variants detectors actually emit.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Label;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Collapse runs of whitespace to single spaces and trim.
pub fn norm_spaces(s: &str) -> String {
    WHITESPACE_RE.replace_all(s.trim(), " ").into_owned()
}

/// Lowercase and strip everything outside `[a-z0-9]`.
pub fn norm_general(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Keep digits only. `"20-45-67"` and `"204567"` collide.
pub fn norm_digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Strip whitespace and uppercase. IBANs are case-insensitive and often
/// printed in groups of four.
pub fn norm_iban(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Keep digits and a leading `+`, dropping spaces and punctuation.
pub fn norm_phone(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|&c| c.is_ascii_digit() || c == '+')
        .collect()
}

/// Compute the dedup key for a value under its label.
pub fn normalize_for_key(label: Label, value: &str) -> String {
    let v = value.trim();
    match label {
        Label::UkSortCode | Label::UkAccountNumber | Label::CreditCardNumber => norm_digits(v),
        Label::UkIban => norm_iban(v),
        // "08/27" and "08-27" collide
        Label::CardExpiry => norm_general(v),
        Label::UkPhoneNumber => norm_phone(v),
        Label::EmailAddress | Label::IpAddress => norm_general(v),
        _ => norm_spaces(v).to_lowercase(),
    }
}
