//! Minimal CSS selector support for host queries.
//!
//! Supported grammar: whitespace-separated descendant chains of compound
//! selectors (`tag`, `#id`, `.class`, combined as `div.list#a`), with an
//! optional leading `:scope` anchoring the chain at the query root.

use std::error::Error;
use std::fmt::{Display, Formatter};

const SCOPE_PSEUDO: &str = ":scope";

/// Selector parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    Empty,
    MisplacedScope(String),
    InvalidToken { selector: String, token: String },
}

impl Display for SelectorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "selector must not be empty"),
            Self::MisplacedScope(selector) => {
                write!(f, "`:scope` must lead the selector: `{selector}`")
            }
            Self::InvalidToken { selector, token } => {
                write!(f, "unsupported selector token `{token}` in `{selector}`")
            }
        }
    }
}

impl Error for SelectorError {}

/// Read access a selector needs to test one node.
pub trait SelectorView<N> {
    fn tag_of(&self, node: N) -> &str;
    fn id_of(&self, node: N) -> Option<&str>;
    fn class_name_of(&self, node: N) -> &str;
    fn parent_of(&self, node: N) -> Option<N>;
}

/// One compound step of a descendant chain.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    scope: bool,
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn matches<N, V>(&self, view: &V, node: N, scope: N) -> bool
    where
        N: Copy + PartialEq,
        V: SelectorView<N>,
    {
        if self.scope {
            return node == scope;
        }
        if let Some(tag) = &self.tag {
            if !view.tag_of(node).eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if view.id_of(node) != Some(id.as_str()) {
                return false;
            }
        }
        let class_name = view.class_name_of(node);
        self.classes
            .iter()
            .all(|class| class_name.split_whitespace().any(|token| token == class))
    }
}

/// Parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    chain: Vec<Compound>,
}

impl Selector {
    /// Parses a selector string.
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(SelectorError::Empty);
        }

        let mut chain = Vec::new();
        for (index, part) in trimmed.split_whitespace().enumerate() {
            if part == SCOPE_PSEUDO {
                if index != 0 {
                    return Err(SelectorError::MisplacedScope(trimmed.to_string()));
                }
                chain.push(Compound {
                    scope: true,
                    ..Compound::default()
                });
                continue;
            }
            chain.push(parse_compound(trimmed, part)?);
        }

        Ok(Self {
            source: trimmed.to_string(),
            chain,
        })
    }

    /// Original selector text, trimmed.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Tests `node` against the chain, resolving `:scope` to `scope`.
    pub fn matches<N, V>(&self, view: &V, node: N, scope: N) -> bool
    where
        N: Copy + PartialEq,
        V: SelectorView<N>,
    {
        let Some((last, ancestors)) = self.chain.split_last() else {
            return false;
        };
        if !last.matches(view, node, scope) {
            return false;
        }

        // Descendant-only chains are matched greedily against the closest
        // qualifying ancestor.
        let mut cursor = view.parent_of(node);
        for compound in ancestors.iter().rev() {
            loop {
                let Some(candidate) = cursor else {
                    return false;
                };
                cursor = view.parent_of(candidate);
                if compound.matches(view, candidate, scope) {
                    break;
                }
            }
        }
        true
    }
}

impl Display for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_compound(selector: &str, part: &str) -> Result<Compound, SelectorError> {
    let invalid = || SelectorError::InvalidToken {
        selector: selector.to_string(),
        token: part.to_string(),
    };

    let mut compound = Compound::default();
    let mut rest = part;

    let tag_len = rest.find(['#', '.']).unwrap_or(rest.len());
    if tag_len > 0 {
        let tag = &rest[..tag_len];
        if !is_identifier(tag) {
            return Err(invalid());
        }
        compound.tag = Some(tag.to_ascii_lowercase());
        rest = &rest[tag_len..];
    }

    while let Some(marker) = rest.chars().next() {
        let body = &rest[1..];
        let name_len = body.find(['#', '.']).unwrap_or(body.len());
        let name = &body[..name_len];
        if !is_identifier(name) {
            return Err(invalid());
        }
        match marker {
            '#' if compound.id.is_none() => compound.id = Some(name.to_string()),
            '.' => compound.classes.push(name.to_string()),
            _ => return Err(invalid()),
        }
        rest = &body[name_len..];
    }

    Ok(compound)
}

fn is_identifier(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
