//! Whitespace-separated class attribute tokens.
//!
//! # Invariants
//! - Matching is whole-token; `overloaded` never matches `not-overloaded`.
//! - Add never duplicates a token; remove of an absent token is a no-op.
//! - A rewritten value uses single spaces between tokens with no padding.

/// Returns whether `class_name` carries `token`.
pub fn has_class(class_name: &str, token: &str) -> bool {
    class_name.split_whitespace().any(|candidate| candidate == token)
}

/// Returns the new attribute value when `token` must be added.
///
/// Returns `None` when the token is already present, so callers can skip the
/// attribute write entirely.
pub fn add_class(class_name: &str, token: &str) -> Option<String> {
    if has_class(class_name, token) {
        return None;
    }

    let mut tokens = class_name.split_whitespace().collect::<Vec<_>>();
    tokens.push(token);
    Some(tokens.join(" "))
}

/// Returns the new attribute value when `token` must be removed.
///
/// Every occurrence is dropped and remaining tokens are re-joined with one
/// space. Returns `None` when the token is absent.
pub fn remove_class(class_name: &str, token: &str) -> Option<String> {
    if !has_class(class_name, token) {
        return None;
    }

    let remaining = class_name
        .split_whitespace()
        .filter(|candidate| *candidate != token)
        .collect::<Vec<_>>();
    Some(remaining.join(" "))
}

/// Returns the new attribute value that sets or clears `token`.
pub fn toggle_class(class_name: &str, token: &str, present: bool) -> Option<String> {
    if present {
        add_class(class_name, token)
    } else {
        remove_class(class_name, token)
    }
}
