//! UK address block expansion.
//!
//! Postcodes are reliable anchors; full postal addresses usually sprawl
//! across the lines around them. Starting from a postcode match, this
//! module grows a candidate block upwards and downwards while lines still
//! look like address components, then applies guardrails so headings and
//! prose paragraphs are never swallowed.

use once_cell::sync::Lazy;
use regex::Regex;

use super::patterns::UK_POSTCODE_RE;

const MAX_BLOCK_LINES: usize = 4;
const MAX_BLOCK_LEN: usize = 260;
const MAX_COMPONENT_LEN: usize = 160;

/// Tokens that suggest a line belongs to a postal address.
const ADDRESS_HINT_TOKENS: &[&str] = &[
    "street",
    "st",
    "road",
    "rd",
    "avenue",
    "ave",
    "lane",
    "ln",
    "drive",
    "dr",
    "flat",
    "apt",
    "apartment",
    "unit",
    "building",
    "house",
    "uk",
    "united kingdom",
    "london",
    "england",
    "scotland",
    "wales",
];

static ADDRESS_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:registered|billing|delivery|shipping|residential|home|office)?\s*address\s*(?:is|:|-|\u{2013}|\u{2014})\s+",
    )
    .expect("valid regex")
});

static DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("valid regex"));

/// Heuristic for whether a single line could be part of a postal address.
fn looks_like_address_component(line: &str) -> bool {
    let s = line.trim();
    if s.is_empty() {
        return false;
    }

    // Avoid swallowing headings like "Address verified:" while still
    // allowing inline "Registered address: Flat 3B, ..." patterns.
    if let Some(colon) = s.find(':')
        && colon <= 30
    {
        let after = s[colon + 1..].trim();
        if after.is_empty() {
            return false;
        }
        let after_lc = after.to_lowercase();
        let after_has_digit = DIGIT_RE.is_match(after);
        let after_has_comma = after.contains(',');
        let after_has_hint = ADDRESS_HINT_TOKENS.iter().any(|tok| after_lc.contains(tok));
        let after_has_postcode = UK_POSTCODE_RE.is_match(after);
        if !(after_has_postcode
            || (after_has_digit && after_has_comma)
            || (after_has_hint && after_has_comma))
        {
            return false;
        }
    }

    // Extremely long lines are likely paragraphs, not address lines.
    if s.len() > MAX_COMPONENT_LEN {
        return false;
    }

    let lc = s.to_lowercase();
    let has_digit = DIGIT_RE.is_match(s);
    let has_comma = s.contains(',');
    let has_hint = ADDRESS_HINT_TOKENS.iter().any(|tok| lc.contains(tok));
    let has_postcode = UK_POSTCODE_RE.is_match(s);

    if has_postcode {
        return true;
    }
    if has_digit && (has_comma || has_hint) {
        return true;
    }
    has_hint && has_comma
}

/// Byte bounds of the line containing `pos` (newline excluded).
fn line_bounds(text: &str, pos: usize) -> (usize, usize) {
    let start = text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = text[pos..].find('\n').map(|i| pos + i).unwrap_or(text.len());
    (start, end)
}

/// Expand a postcode span to a likely multi-line address block.
///
/// Returns the trimmed block bounds, or `None` when the surrounding lines
/// do not pass the component heuristics or the guardrails fail.
pub fn expand_to_address_block(text: &str, start: usize) -> Option<(usize, usize)> {
    let (line_start, line_end) = line_bounds(text, start);
    if !looks_like_address_component(&text[line_start..line_end]) {
        return None;
    }

    let mut block_start = line_start;
    let mut block_end = line_end;
    let mut lines_used = 1;

    // Expand upwards, stopping at blank lines or non-address lines.
    while lines_used < MAX_BLOCK_LINES && block_start > 0 {
        let prev_end = block_start - 1; // at '\n'
        let prev_start = text[..prev_end].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let prev_raw = &text[prev_start..prev_end];
        if prev_raw.trim().is_empty() || !looks_like_address_component(prev_raw) {
            break;
        }
        block_start = prev_start;
        lines_used += 1;
    }

    // Expand downwards.
    while lines_used < MAX_BLOCK_LINES && block_end < text.len() {
        if !text[block_end..].starts_with('\n') {
            break;
        }
        let next_start = block_end + 1;
        let next_end = text[next_start..]
            .find('\n')
            .map(|i| next_start + i)
            .unwrap_or(text.len());
        let next_raw = &text[next_start..next_end];
        if next_raw.trim().is_empty() || !looks_like_address_component(next_raw) {
            break;
        }
        block_end = next_end;
        lines_used += 1;
    }

    let mut raw_block = &text[block_start..block_end];
    if raw_block.trim().is_empty() {
        return None;
    }

    // Trim lead-ins like "Registered address is ..." so the label text is
    // not masked as part of the address. Only the first line is checked.
    let first_line_end = raw_block.find('\n').unwrap_or(raw_block.len());
    if let Some(m) = ADDRESS_PREFIX_RE.find(&raw_block[..first_line_end]) {
        block_start += m.end();
        raw_block = &text[block_start..block_end];
        if raw_block.trim().is_empty() {
            return None;
        }
    }

    let candidate = raw_block.trim();

    // Guardrails: a real address has a postcode, digits, and at least one
    // comma, and is not arbitrarily long.
    if !UK_POSTCODE_RE.is_match(candidate)
        || !DIGIT_RE.is_match(candidate)
        || candidate.matches(',').count() < 1
        || candidate.len() > MAX_BLOCK_LEN
    {
        return None;
    }

    // Map back to exact offsets excluding surrounding whitespace.
    let left_ws = raw_block.len() - raw_block.trim_start().len();
    let right_ws = raw_block.len() - raw_block.trim_end().len();
    Some((block_start + left_ws, block_end - right_ws))
}
