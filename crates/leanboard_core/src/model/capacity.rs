//! Capacity parsing for list headings and card counters.
//!
//! # Responsibility
//! - Extract the optional `(max N)` limit from heading text.
//! - Read the card count from counter text with leading-integer semantics.
//!
//! # Invariants
//! - Parsers never panic and never produce sentinel values; absence is `None`.
//! - Values that overflow `i64` are treated as absent.

use once_cell::sync::Lazy;
use regex::Regex;

static MAX_CARDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(max ([0-9]+)\)").expect("valid max cards regex"));

/// Parses the list limit from heading text.
///
/// Only the first `(max N)` annotation counts. `(max 0)` is a real limit.
pub fn parse_max_cards(text: &str) -> Option<i64> {
    let captures = MAX_CARDS_RE.captures(text)?;
    captures.get(1)?.as_str().parse::<i64>().ok()
}

/// Parses a card count using leading-integer rules.
///
/// Leading whitespace and one optional sign are accepted; parsing stops at the
/// first non-digit. Text without leading digits yields `None`.
pub fn parse_card_count(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let magnitude = rest[..digits_len].parse::<i64>().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
