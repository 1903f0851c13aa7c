//! Structural validators for checksummed and fixed-length PII values.
//!
//! Validators adjust confidence, they never gate: a value that fails its
//! checksum keeps its span and loses some score. Unparseable values count
//! as failed checks rather than errors, since validation must never block
//! masking.

use crate::models::Label;

use super::normalize::{norm_digits, norm_iban};

/// Luhn checksum over the digits of `number`.
///
/// Values with fewer than 13 digits fail outright; no real card number is
/// that short.
pub fn luhn_check(number: &str) -> bool {
    let digits = norm_digits(number);
    if digits.len() < 13 {
        return false;
    }
    let mut total: u32 = 0;
    let mut alt = false;
    for ch in digits.chars().rev() {
        let mut d = ch as u32 - '0' as u32;
        if alt {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        total += d;
        alt = !alt;
    }
    total % 10 == 0
}

/// Basic IBAN mod-97 validation.
pub fn iban_mod97(iban: &str) -> bool {
    let s = norm_iban(iban);
    if s.len() < 15 {
        return false;
    }
    // Move the first four chars to the end, then convert letters A..Z to
    // the numbers 10..35.
    let rearranged: String = s.chars().skip(4).chain(s.chars().take(4)).collect();
    let mut converted = String::with_capacity(rearranged.len() * 2);
    for ch in rearranged.chars() {
        if ch.is_ascii_digit() {
            converted.push(ch);
        } else if ch.is_ascii_uppercase() {
            let val = ch as u32 - 'A' as u32 + 10;
            converted.push_str(&val.to_string());
        } else {
            return false;
        }
    }
    // mod 97 in 9-digit chunks to stay within u64
    let mut remainder: u64 = 0;
    let bytes = converted.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let end = (i + 9).min(bytes.len());
        let chunk = format!("{}{}", remainder, &converted[i..end]);
        remainder = match chunk.parse::<u64>() {
            Ok(n) => n % 97,
            Err(_) => return false,
        };
        i = end;
    }
    remainder == 1
}

/// Apply the label's structural check to `value` and shift `base_score`
/// accordingly, clamped into `[0, 1]`.
///
/// | label              | check                 | pass  | fail  |
/// |--------------------|-----------------------|-------|-------|
/// | CREDIT_CARD_NUMBER | Luhn                  | +0.08 | -0.15 |
/// | UK_IBAN            | mod-97                | +0.08 | -0.20 |
/// | UK_SORT_CODE       | 6 digits              | +0.03 | -0.10 |
/// | UK_ACCOUNT_NUMBER  | 8 digits              | +0.02 | -0.10 |
///
/// All other labels pass through unchanged.
pub fn adjust_score(label: Label, value: &str, base_score: f64) -> f64 {
    let delta = match label {
        Label::CreditCardNumber => {
            if luhn_check(value) {
                0.08
            } else {
                -0.15
            }
        }
        Label::UkIban => {
            if iban_mod97(value) {
                0.08
            } else {
                -0.20
            }
        }
        Label::UkSortCode => {
            if norm_digits(value).len() == 6 {
                0.03
            } else {
                -0.10
            }
        }
        Label::UkAccountNumber => {
            if norm_digits(value).len() == 8 {
                0.02
            } else {
                -0.10
            }
        }
        _ => 0.0,
    };
    (base_score + delta).clamp(0.0, 1.0)
}
