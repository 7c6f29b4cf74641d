//! Derived list state and its text/attribute encodings.
//!
//! # Responsibility
//! - Parse capacity and card counts from host text.
//! - Edit class attribute values token-wise.
//! - Define read-only list reports shared by monitors and callers.
//!
//! # Invariants
//! - Nothing in this module touches the host page; all functions are pure.

pub mod capacity;
pub mod class_tokens;

use serde::Serialize;

/// Read-only report of one monitored list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListSnapshot {
    /// Heading text as observed on the page.
    pub title: String,
    /// Limit parsed from the heading, if any.
    pub max_capacity: Option<i64>,
    /// Count parsed from the counter, if any.
    pub card_count: Option<i64>,
    /// Whether the overloaded marker is currently present on the region.
    pub overloaded: bool,
}
